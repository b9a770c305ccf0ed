//! Jira 스토리 본문 조회 유스케이스.

use anyhow::{Context, Result};

use crate::application::ports::{ConfigRepository, CredentialStore, IssueFactory, Reporter};

pub struct FetchStoryUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub credential_store: &'a dyn CredentialStore,
    pub issue_factory: &'a dyn IssueFactory,
    pub reporter: &'a dyn Reporter,
}

impl FetchStoryUseCase<'_> {
    /// `bbpilot story <KEY>` 명령 진입점.
    pub async fn execute(&self, key: &str) -> Result<()> {
        let config = self.config_repo.load().context("failed to load bbpilot config")?;
        let credential = self
            .credential_store
            .get()
            .context("failed to read stored credential")?;

        let Some(gateway) = self.issue_factory.build(&config, credential)? else {
            anyhow::bail!("Jira is not configured; set `jira.base_url` in the bbpilot config");
        };

        let story = gateway
            .fetch_story(key)
            .await
            .with_context(|| format!("failed to fetch story {key}"))?;

        self.reporter.section("Story");
        self.reporter.kv("Key", &story.key);
        if story.text.is_empty() {
            // 필드 모양을 해석하지 못한 경우에도 비정상 종료 대신 빈 본문으로 안내한다.
            self.reporter.status("Story", "no readable description found");
        } else {
            self.reporter.raw(&story.text);
        }
        Ok(())
    }
}
