//! 서명 중복 방지를 거친 코멘트 게시 유스케이스.

use std::sync::Mutex;

use anyhow::Result;

use crate::application::ports::{
    BackendFactory, BranchInspector, ConfigRepository, CredentialStore, PrGateway, Reporter,
    UserConfirmer,
};
use crate::application::usecases::ensure_pr::{PrDecision, ensure_pr};
use crate::application::usecases::session::{
    drop_credential_on_auth_failure, load_client_context, resolve_source_branch,
};
use crate::domain::dedupe::{DeduplicationStore, signature_of_draft, signature_of_existing};
use crate::domain::pr::CommentDraft;

/// 게시 실행 결과 집계.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostOutcome {
    pub posted: usize,
    pub skipped: usize,
}

pub struct PostCommentsUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub credential_store: &'a dyn CredentialStore,
    pub branch: &'a dyn BranchInspector,
    pub backend_factory: &'a dyn BackendFactory,
    pub reporter: &'a dyn Reporter,
    pub confirmer: &'a dyn UserConfirmer,
    /// 인스턴스 단위 중복 방지 상태. 세션이 사는 동안 유지된다.
    pub dedupe: &'a Mutex<DeduplicationStore>,
}

impl PostCommentsUseCase<'_> {
    /// 초안 묶음을 PR에 게시한다. `pr_override`가 없으면 현재 브랜치로 PR을 확보한다.
    pub async fn execute(
        &self,
        drafts: Vec<CommentDraft>,
        pr_override: Option<u64>,
    ) -> Result<PostOutcome> {
        if drafts.is_empty() {
            self.reporter.status("Post", "no drafts to post");
            return Ok(PostOutcome::default());
        }

        let ctx = load_client_context(
            self.config_repo,
            self.credential_store,
            self.branch,
            self.backend_factory,
            self.reporter,
        )?;

        let result = self.run(ctx.gateway.as_ref(), &ctx, drafts, pr_override).await;
        drop_credential_on_auth_failure(result, self.credential_store, self.reporter)
    }

    async fn run(
        &self,
        gateway: &dyn PrGateway,
        ctx: &super::session::ClientContext,
        drafts: Vec<CommentDraft>,
        pr_override: Option<u64>,
    ) -> Result<PostOutcome> {
        let pr_id = match pr_override {
            Some(id) => id,
            None => {
                let source = resolve_source_branch(&ctx.coords, self.branch)?;
                match ensure_pr(gateway, &ctx.coords, &source, self.confirmer, self.reporter)
                    .await?
                {
                    PrDecision::Ready(pr) => pr.id,
                    PrDecision::OnBaseBranch | PrDecision::Cancelled => {
                        return Ok(PostOutcome::default());
                    }
                }
            }
        };

        self.refresh_existing_signatures(gateway, pr_id).await?;

        self.reporter.section("Post Comments");
        let mut outcome = PostOutcome::default();

        for draft in drafts {
            let signature = signature_of_draft(pr_id, &draft);

            let duplicate = {
                let store = self.dedupe.lock().unwrap_or_else(|e| e.into_inner());
                store.is_duplicate(pr_id, &signature)
            };
            if duplicate {
                outcome.skipped += 1;
                tracing::debug!(pr_id, %signature, "skipping duplicate comment");
                self.reporter
                    .status("Dedup", &describe_skip(&draft));
                continue;
            }

            gateway.post_comment(pr_id, &draft).await?;
            // 게시 성공이 확인된 뒤에만 서명을 기록한다.
            self.dedupe
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .record_posted(pr_id, signature);
            outcome.posted += 1;
            self.reporter.status("Post", &describe_post(&draft));
        }

        self.reporter.status(
            "Done",
            &format!("posted {} comment(s), skipped {} duplicate(s)", outcome.posted, outcome.skipped),
        );
        Ok(outcome)
    }

    /// TTL이 지났거나 처음 보는 PR이면 기존 코멘트 서명을 다시 로딩한다.
    async fn refresh_existing_signatures(
        &self,
        gateway: &dyn PrGateway,
        pr_id: u64,
    ) -> Result<()> {
        let needs_refresh = {
            let store = self.dedupe.lock().unwrap_or_else(|e| e.into_inner());
            store.needs_refresh(pr_id)
        };
        if !needs_refresh {
            return Ok(());
        }

        let existing = gateway.list_comments(pr_id).await?;
        let count = existing.len();
        let signatures: Vec<String> = existing
            .iter()
            .map(|comment| signature_of_existing(pr_id, comment))
            .collect();
        self.dedupe
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace_existing(pr_id, signatures);
        self.reporter.status(
            "Dedup",
            &format!("loaded {count} existing comment signature(s) from PR #{pr_id}"),
        );
        Ok(())
    }
}

fn describe_post(draft: &CommentDraft) -> String {
    match (&draft.target_path, draft.anchor_line) {
        (Some(path), Some(line)) => format!("inline comment at {path}:{line}"),
        (Some(path), None) => format!("comment for {path}"),
        _ => "general comment".to_string(),
    }
}

fn describe_skip(draft: &CommentDraft) -> String {
    match (&draft.target_path, draft.anchor_line) {
        (Some(path), Some(line)) => format!("already posted: {path}@{line}"),
        (Some(path), None) => format!("already posted: {path}"),
        _ => "already posted: general comment".to_string(),
    }
}
