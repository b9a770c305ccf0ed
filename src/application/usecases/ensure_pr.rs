//! 현재 브랜치에 대한 PR 확보 유스케이스.
//!
//! 상태 전이: base branch 위 ⇒ 경고 후 중단 | feature branch ⇒ 검색 ⇒
//! 발견 ⇒ Ready | 미발견 ⇒ 생성 확인 ⇒ (승인) 생성 ⇒ Ready | (거절) Cancelled.

use anyhow::{Context, Result};

use crate::application::ports::{
    BackendFactory, BranchInspector, ConfigRepository, CredentialStore, PrGateway, Reporter,
    UserConfirmer,
};
use crate::application::usecases::session::{
    drop_credential_on_auth_failure, load_client_context, resolve_source_branch,
};
use crate::domain::coords::RepoCoordinates;
use crate::domain::policy::{DEFAULT_PR_DESCRIPTION, default_pr_title};
use crate::domain::pr::PullRequestRef;

/// PR 확보 단계의 판단 결과.
pub enum PrDecision {
    Ready(PullRequestRef),
    OnBaseBranch,
    Cancelled,
}

pub struct EnsurePrUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub credential_store: &'a dyn CredentialStore,
    pub branch: &'a dyn BranchInspector,
    pub backend_factory: &'a dyn BackendFactory,
    pub reporter: &'a dyn Reporter,
    pub confirmer: &'a dyn UserConfirmer,
}

impl EnsurePrUseCase<'_> {
    /// `bbpilot pr` 명령 진입점. 확보된 PR 정보를 출력한다.
    pub async fn execute(&self) -> Result<()> {
        let ctx = load_client_context(
            self.config_repo,
            self.credential_store,
            self.branch,
            self.backend_factory,
            self.reporter,
        )?;

        let source = resolve_source_branch(&ctx.coords, self.branch)?;

        let result = ensure_pr(
            ctx.gateway.as_ref(),
            &ctx.coords,
            &source,
            self.confirmer,
            self.reporter,
        )
        .await;
        let decision =
            drop_credential_on_auth_failure(result, self.credential_store, self.reporter)?;

        if let PrDecision::Ready(pr) = decision {
            self.reporter.section("Pull Request");
            self.reporter.kv("Id", &pr.id.to_string());
            self.reporter
                .kv("Branches", &format!("{} -> {}", pr.source_branch, pr.target_branch));
            if !pr.web_url.is_empty() {
                self.reporter.kv("URL", &pr.web_url);
            }
        }
        Ok(())
    }
}

/// 검색/생성으로 (source -> base) PR을 확보한다. 다른 유스케이스와 공유된다.
pub(super) async fn ensure_pr(
    gateway: &dyn PrGateway,
    coords: &RepoCoordinates,
    source: &str,
    confirmer: &dyn UserConfirmer,
    reporter: &dyn Reporter,
) -> Result<PrDecision> {
    let target = coords.base_branch.as_str();

    if source == target {
        reporter.status(
            "Branch",
            &format!("currently on {target}; switch to a feature branch to open a PR"),
        );
        return Ok(PrDecision::OnBaseBranch);
    }

    reporter.status("PR", &format!("searching for open PR {source} -> {target}"));
    if let Some(pr) = gateway.find_pr(source, target).await? {
        reporter.status("PR", &format!("using PR #{}", pr.id));
        return Ok(PrDecision::Ready(pr));
    }

    let create = self::confirm_create(confirmer, source, target)?;
    if !create {
        reporter.status("PR", "creation declined; nothing to do");
        return Ok(PrDecision::Cancelled);
    }

    let pr = gateway
        .create_pr(
            source,
            target,
            Some(&default_pr_title(source, target)),
            Some(DEFAULT_PR_DESCRIPTION),
        )
        .await?;
    reporter.status("PR", &format!("created PR #{}", pr.id));
    Ok(PrDecision::Ready(pr))
}

fn confirm_create(confirmer: &dyn UserConfirmer, source: &str, target: &str) -> Result<bool> {
    confirmer
        .confirm(&format!("No PR found for {source}. Create PR to {target}?"))
        .context("failed to read confirmation")
}
