//! 애플리케이션 조립(composition root) 모듈.

use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::application::ports::{ConfigRepository, CredentialStore, Reporter, UserConfirmer};
use crate::application::usecases::ensure_pr::EnsurePrUseCase;
use crate::application::usecases::fetch_story::FetchStoryUseCase;
use crate::application::usecases::inspect_config::InspectConfigUseCase;
use crate::application::usecases::post_comments::PostCommentsUseCase;
use crate::application::usecases::show_diff::ShowDiffUseCase;
use crate::domain::dedupe::DeduplicationStore;
use crate::domain::policy::CommentStyle;
use crate::infrastructure::adapters::{
    AutoConfirmer, BitbucketBackendFactory, ConsoleReporter, FileCredentialStore,
    GitBranchInspector, JiraIssueFactory, JsonConfigRepository, StdinConfirmer,
};

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
/// 중복 방지 상태는 여기서만 소유되고 유스케이스는 빌려 쓴다.
pub struct AppComposition {
    config_repo: JsonConfigRepository,
    credential_store: FileCredentialStore,
    branch: GitBranchInspector,
    backend_factory: BitbucketBackendFactory,
    issue_factory: JiraIssueFactory,
    reporter: ConsoleReporter,
    stdin_confirmer: StdinConfirmer,
    auto_confirmer: AutoConfirmer,
    dedupe: Mutex<DeduplicationStore>,
}

impl Default for AppComposition {
    fn default() -> Self {
        Self {
            config_repo: JsonConfigRepository,
            credential_store: FileCredentialStore::new(),
            branch: GitBranchInspector,
            backend_factory: BitbucketBackendFactory,
            issue_factory: JiraIssueFactory,
            reporter: ConsoleReporter,
            stdin_confirmer: StdinConfirmer,
            auto_confirmer: AutoConfirmer,
            dedupe: Mutex::new(DeduplicationStore::new()),
        }
    }
}

impl AppComposition {
    fn confirmer(&self, auto_confirm: bool) -> &dyn UserConfirmer {
        if auto_confirm {
            &self.auto_confirmer
        } else {
            &self.stdin_confirmer
        }
    }

    /// 설정 점검 유스케이스를 생성한다.
    pub fn inspect_config_usecase(&self) -> InspectConfigUseCase<'_> {
        InspectConfigUseCase {
            config_repo: &self.config_repo,
            reporter: &self.reporter,
        }
    }

    /// PR 확보 유스케이스를 생성한다.
    pub fn ensure_pr_usecase(&self, auto_confirm: bool) -> EnsurePrUseCase<'_> {
        EnsurePrUseCase {
            config_repo: &self.config_repo,
            credential_store: &self.credential_store,
            branch: &self.branch,
            backend_factory: &self.backend_factory,
            reporter: &self.reporter,
            confirmer: self.confirmer(auto_confirm),
        }
    }

    /// diff 조회 유스케이스를 생성한다.
    pub fn show_diff_usecase(&self) -> ShowDiffUseCase<'_> {
        ShowDiffUseCase {
            config_repo: &self.config_repo,
            credential_store: &self.credential_store,
            branch: &self.branch,
            backend_factory: &self.backend_factory,
            reporter: &self.reporter,
            confirmer: &self.stdin_confirmer,
        }
    }

    /// 코멘트 게시 유스케이스를 생성한다.
    pub fn post_comments_usecase(&self, auto_confirm: bool) -> PostCommentsUseCase<'_> {
        PostCommentsUseCase {
            config_repo: &self.config_repo,
            credential_store: &self.credential_store,
            branch: &self.branch,
            backend_factory: &self.backend_factory,
            reporter: &self.reporter,
            confirmer: self.confirmer(auto_confirm),
            dedupe: &self.dedupe,
        }
    }

    /// Jira 스토리 조회 유스케이스를 생성한다.
    pub fn fetch_story_usecase(&self) -> FetchStoryUseCase<'_> {
        FetchStoryUseCase {
            config_repo: &self.config_repo,
            credential_store: &self.credential_store,
            issue_factory: &self.issue_factory,
            reporter: &self.reporter,
        }
    }

    /// 초안 본문 렌더링에 쓸 코멘트 스타일.
    pub fn comment_style(&self) -> Result<CommentStyle> {
        let config = self
            .config_repo
            .load()
            .context("failed to load bbpilot config")?;
        Ok(config.comment_style())
    }

    /// `bbpilot login`: 자격 증명을 인코딩해 저장한다.
    pub fn store_credential(&self, username: &str, secret: &str) -> Result<()> {
        self.credential_store
            .set(username, secret)
            .context("failed to store credential")?;
        self.reporter.status("Auth", "credential stored");
        Ok(())
    }

    /// `bbpilot logout`: 저장된 자격 증명을 지운다.
    pub fn clear_credential(&self) -> Result<()> {
        self.credential_store
            .clear()
            .context("failed to clear credential")?;
        self.reporter.status("Auth", "credential cleared");
        Ok(())
    }
}
