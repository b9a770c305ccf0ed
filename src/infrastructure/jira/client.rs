//! Jira 이슈 조회 구현.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::application::ports::IssueGateway;
use crate::domain::error::Error;
use crate::domain::pr::StoryDetails;
use crate::infrastructure::http::ApiTransport;

use super::adf::extract_text;

/// parent 이슈 추적 상한. 순환/비정상 계층에서 무한히 따라가지 않는다.
const MAX_PARENT_HOPS: u32 = 3;

pub struct JiraClient {
    client: Client,
    transport: ApiTransport,
    base_url: String,
    story_field: String,
    credential: Option<String>,
}

impl JiraClient {
    pub fn new(
        base_url: String,
        story_field: String,
        credential: Option<String>,
        transport: ApiTransport,
    ) -> Self {
        Self {
            client: Client::new(),
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            story_field,
            credential,
        }
    }

    async fn fetch_issue(&self, key: &str) -> Result<Value, Error> {
        let url = format!("{}/rest/api/2/issue/{key}", self.base_url);
        let mut request = self
            .client
            .request(Method::GET, url)
            .header("User-Agent", "bbpilot")
            .header("Accept", "application/json");
        if let Some(token) = &self.credential {
            request = request.header("Authorization", format!("Basic {token}"));
        }

        let response = self.transport.execute(request).await?;
        response
            .json()
            .await
            .map_err(|err| Error::ParseAnomaly(format!("malformed Jira response: {err}")))
    }

    /// 스토리 필드 -> description 순서로 본문을 찾는다.
    fn story_text(&self, issue: &Value) -> String {
        let fields = &issue["fields"];

        let custom = field_text(&fields[self.story_field.as_str()]);
        if !custom.is_empty() {
            return custom;
        }
        field_text(&fields["description"])
    }
}

/// 문자열 값은 그대로, 오브젝트는 ADF 트리로 본다.
/// 어느 쪽도 아니면 경고만 남기고 빈 본문으로 degrade한다.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Object(_) => extract_text(value),
        Value::Null => String::new(),
        other => {
            tracing::warn!("unrecognized Jira field shape: {other}");
            String::new()
        }
    }
}

#[async_trait]
impl IssueGateway for JiraClient {
    async fn fetch_story(&self, key: &str) -> Result<StoryDetails, Error> {
        let mut current_key = key.to_string();

        for _ in 0..=MAX_PARENT_HOPS {
            let issue = self.fetch_issue(&current_key).await?;
            let text = self.story_text(&issue);
            if !text.is_empty() {
                return Ok(StoryDetails {
                    key: current_key,
                    text,
                });
            }

            // 서브태스크 등 본문이 비어 있는 이슈는 parent에서 찾는다.
            match issue["fields"]["parent"]["key"].as_str() {
                Some(parent_key) if parent_key != current_key => {
                    tracing::debug!(issue = %current_key, parent = parent_key, "story field empty, following parent");
                    current_key = parent_key.to_string();
                }
                _ => break,
            }
        }

        tracing::warn!(issue = key, "no readable story text found");
        Ok(StoryDetails {
            key: key.to_string(),
            text: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::Server) -> JiraClient {
        JiraClient::new(
            server.url(),
            "customfield_10041".to_string(),
            Some("dG9rZW4=".to_string()),
            ApiTransport::new(0, 0),
        )
    }

    #[tokio::test]
    async fn plain_string_story_field_is_used_as_is() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/issue/PROJ-1")
            .with_body(r#"{"fields": {"customfield_10041": "Given X, then Y"}}"#)
            .create_async()
            .await;

        let story = client(&server).fetch_story("PROJ-1").await.unwrap();
        assert_eq!(story.key, "PROJ-1");
        assert_eq!(story.text, "Given X, then Y");
    }

    #[tokio::test]
    async fn adf_story_field_is_flattened() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/issue/PROJ-2")
            .with_body(
                r#"{"fields": {"customfield_10041": {
                    "type": "doc",
                    "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "crit 1"}]},
                        {"type": "paragraph", "content": [{"type": "text", "text": "crit 2"}]}
                    ]}}}"#,
            )
            .create_async()
            .await;

        let story = client(&server).fetch_story("PROJ-2").await.unwrap();
        assert_eq!(story.text, "crit 1\ncrit 2");
    }

    #[tokio::test]
    async fn empty_subtask_falls_back_to_description_then_parent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/issue/PROJ-10")
            .with_body(
                r#"{"fields": {"customfield_10041": null, "description": null,
                    "parent": {"key": "PROJ-9"}}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/rest/api/2/issue/PROJ-9")
            .with_body(r#"{"fields": {"description": "parent story text"}}"#)
            .create_async()
            .await;

        let story = client(&server).fetch_story("PROJ-10").await.unwrap();
        assert_eq!(story.key, "PROJ-9");
        assert_eq!(story.text, "parent story text");
    }

    #[tokio::test]
    async fn unreadable_issue_degrades_to_empty_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/issue/PROJ-3")
            .with_body(r#"{"fields": {"customfield_10041": [1, 2, 3]}}"#)
            .create_async()
            .await;

        let story = client(&server).fetch_story("PROJ-3").await.unwrap();
        assert_eq!(story.key, "PROJ-3");
        assert!(story.text.is_empty());
    }
}
