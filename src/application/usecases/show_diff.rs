//! PR diff 조회/분해 유스케이스.

use anyhow::Result;

use crate::application::ports::{
    BackendFactory, BranchInspector, ConfigRepository, CredentialStore, PrGateway, Reporter,
    UserConfirmer,
};
use crate::application::usecases::ensure_pr::{PrDecision, ensure_pr};
use crate::application::usecases::session::{
    drop_credential_on_auth_failure, load_client_context, resolve_source_branch,
};
use crate::domain::diff::{DiffChunk, parse_chunks};

pub struct ShowDiffUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub credential_store: &'a dyn CredentialStore,
    pub branch: &'a dyn BranchInspector,
    pub backend_factory: &'a dyn BackendFactory,
    pub reporter: &'a dyn Reporter,
    pub confirmer: &'a dyn UserConfirmer,
}

impl ShowDiffUseCase<'_> {
    /// `bbpilot diff` 명령 진입점. 파일 단위 청크 요약과 원문을 출력한다.
    pub async fn execute(&self, pr_override: Option<u64>) -> Result<()> {
        let ctx = load_client_context(
            self.config_repo,
            self.credential_store,
            self.branch,
            self.backend_factory,
            self.reporter,
        )?;

        let result = self.run(ctx.gateway.as_ref(), &ctx, pr_override).await;
        drop_credential_on_auth_failure(result, self.credential_store, self.reporter)
    }

    async fn run(
        &self,
        gateway: &dyn PrGateway,
        ctx: &super::session::ClientContext,
        pr_override: Option<u64>,
    ) -> Result<()> {
        let pr_id = match pr_override {
            Some(id) => id,
            None => {
                let source = resolve_source_branch(&ctx.coords, self.branch)?;
                match ensure_pr(gateway, &ctx.coords, &source, self.confirmer, self.reporter)
                    .await?
                {
                    PrDecision::Ready(pr) => pr.id,
                    PrDecision::OnBaseBranch | PrDecision::Cancelled => return Ok(()),
                }
            }
        };

        let raw = gateway.fetch_diff(pr_id).await?;
        let chunks = parse_chunks(&raw);

        self.reporter.section("Diff");
        if chunks.is_empty() {
            // 인식 가능한 파일 헤더가 없으면 빈 결과로 마무리한다.
            tracing::warn!(pr_id, "diff contained no recognizable file chunks");
            self.reporter.status("Diff", &format!("PR #{pr_id} has no changes"));
            return Ok(());
        }

        self.reporter
            .status("Diff", &format!("PR #{pr_id}: {} file(s) changed", chunks.len()));
        for chunk in &chunks {
            self.reporter.kv(&chunk.file_path, &summarize(chunk));
        }

        self.reporter.raw("");
        self.reporter.raw(&raw);
        Ok(())
    }
}

fn summarize(chunk: &DiffChunk) -> String {
    let mut added = 0usize;
    let mut removed = 0usize;
    for line in &chunk.lines {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if line.starts_with('+') {
            added += 1;
        } else if line.starts_with('-') {
            removed += 1;
        }
    }
    format!("+{added} -{removed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_counts_body_lines_only() {
        let chunk = DiffChunk {
            file_path: "src/app.rs".to_string(),
            lines: vec![
                "diff --git a/src/app.rs b/src/app.rs".to_string(),
                "--- a/src/app.rs".to_string(),
                "+++ b/src/app.rs".to_string(),
                "@@ -1,3 +1,4 @@".to_string(),
                " fn main() {".to_string(),
                "-    old();".to_string(),
                "+    new();".to_string(),
                "+    extra();".to_string(),
                " }".to_string(),
            ],
        };
        assert_eq!(summarize(&chunk), "+2 -1");
    }
}
