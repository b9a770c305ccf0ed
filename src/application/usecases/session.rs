//! 유스케이스 공통 실행 컨텍스트(설정/좌표/게이트웨이) 준비 단계.

use anyhow::{Context, Result};

use crate::application::ports::{
    BackendFactory, BranchInspector, ConfigRepository, CredentialStore, PrGateway, Reporter,
};
use crate::domain::coords::RepoCoordinates;
use crate::domain::error::Error;
use crate::infrastructure::config::{Config, resolve_coordinates};

/// 한 번의 명령 실행 동안 공유되는 상태.
pub(super) struct ClientContext {
    pub coords: RepoCoordinates,
    pub gateway: Box<dyn PrGateway>,
}

/// 설정 로딩, remote 기반 좌표 해석, 자격 증명 확인, 게이트웨이 생성까지 선행한다.
pub(super) fn load_client_context(
    config_repo: &dyn ConfigRepository,
    credential_store: &dyn CredentialStore,
    branch: &dyn BranchInspector,
    backend_factory: &dyn BackendFactory,
    reporter: &dyn Reporter,
) -> Result<ClientContext> {
    reporter.section("Load Config");
    let config = config_repo.load().context("failed to load bbpilot config")?;

    let remote_url = branch.remote_url().unwrap_or_default();
    let coords = resolve_coordinates(&config, remote_url.as_deref())?;

    reporter.kv("Kind", coords.kind.label());
    reporter.kv("Repository", &format!("{}/{}", coords.workspace_or_project, coords.repo));
    reporter.kv("API Base", &coords.api_base);

    let credential = credential_store
        .get()
        .context("failed to read stored credential")?;
    if credential.is_none() {
        anyhow::bail!(
            "no Bitbucket credential found. Run `bbpilot login` or set BITBUCKET_EMAIL/BITBUCKET_TOKEN"
        );
    }

    let gateway = backend_factory.build(&coords, credential, &config);

    Ok(ClientContext { coords, gateway })
}

/// PR source 브랜치를 정한다. 설정의 merge branch 고정값이 있으면 그 값이,
/// 없으면 현재 git 브랜치가 쓰인다.
pub(super) fn resolve_source_branch(
    coords: &RepoCoordinates,
    branch: &dyn BranchInspector,
) -> Result<String> {
    if let Some(source) = &coords.merge_branch {
        tracing::debug!(source, "using configured merge branch as PR source");
        return Ok(source.clone());
    }
    branch
        .current_branch()
        .context("failed to determine current branch")
}

/// 401로 끝난 실행에서 저장된 자격 증명을 무효화한다.
/// 실패한 호출의 결과는 그대로 전파한다.
pub(super) fn drop_credential_on_auth_failure<T>(
    result: Result<T>,
    credential_store: &dyn CredentialStore,
    reporter: &dyn Reporter,
) -> Result<T> {
    if let Err(err) = &result
        && let Some(Error::Authentication(_)) = err.downcast_ref::<Error>()
    {
        match credential_store.clear() {
            Ok(()) => reporter.status(
                "Auth",
                "stored credential cleared; run `bbpilot login` to re-authenticate",
            ),
            Err(clear_err) => {
                tracing::warn!("failed to clear stored credential: {clear_err:#}");
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coords::{ApiKind, CLOUD_API_BASE};

    struct StaticBranch;

    impl BranchInspector for StaticBranch {
        fn current_branch(&self) -> Result<String> {
            Ok("feature/detected".to_string())
        }

        fn remote_url(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn coords(merge_branch: Option<&str>) -> RepoCoordinates {
        RepoCoordinates {
            kind: ApiKind::Cloud,
            workspace_or_project: "acme".to_string(),
            repo: "widgets".to_string(),
            base_branch: "main".to_string(),
            merge_branch: merge_branch.map(str::to_string),
            api_base: CLOUD_API_BASE.to_string(),
        }
    }

    #[test]
    fn configured_merge_branch_overrides_detected_branch() {
        let source = resolve_source_branch(&coords(Some("release/1.2")), &StaticBranch).unwrap();
        assert_eq!(source, "release/1.2");
    }

    #[test]
    fn current_branch_is_used_without_an_override() {
        let source = resolve_source_branch(&coords(None), &StaticBranch).unwrap();
        assert_eq!(source, "feature/detected");
    }
}
