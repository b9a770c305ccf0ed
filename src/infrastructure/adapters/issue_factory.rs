//! Jira 게이트웨이 팩토리 포트 구현 어댑터.

use anyhow::Result;

use crate::application::ports::{IssueFactory, IssueGateway};
use crate::infrastructure::config::Config;
use crate::infrastructure::http::ApiTransport;
use crate::infrastructure::jira::JiraClient;

/// 설정에 Jira 베이스 URL이 있을 때만 클라이언트를 만든다.
pub struct JiraIssueFactory;

impl IssueFactory for JiraIssueFactory {
    fn build(
        &self,
        config: &Config,
        credential: Option<String>,
    ) -> Result<Option<Box<dyn IssueGateway>>> {
        let Some(base_url) = config.jira.base_url.as_deref().filter(|_| config.jira.is_configured())
        else {
            return Ok(None);
        };

        let transport = ApiTransport::new(config.max_retries(), config.rate_limit_per_minute());
        Ok(Some(Box::new(JiraClient::new(
            base_url.to_string(),
            config.jira.story_field(),
            credential,
            transport,
        ))))
    }
}
