//! 설정/remote URL을 저장소 좌표로 확정하는 해석 단계.
//!
//! 명시 설정이 항상 remote 자동 감지보다 우선한다.

use crate::domain::coords::{ApiKind, CLOUD_API_BASE, RepoCoordinates, parse_remote_url};
use crate::domain::error::Error;

use super::types::Config;

/// 명시 설정 -> remote URL 순서로 좌표를 해석한다.
/// 둘 다 실패하면 사용자가 고칠 수 있는 설정 오류로 끝난다.
pub fn resolve_coordinates(
    config: &Config,
    remote_url: Option<&str>,
) -> Result<RepoCoordinates, Error> {
    let base_branch = config.base_branch();
    let merge_branch = config.merge_branch();
    let repo_cfg = &config.repository;

    let workspace = trimmed(repo_cfg.workspace.as_deref());
    let project = trimmed(repo_cfg.project.as_deref());
    let repo = trimmed(repo_cfg.repo.as_deref());

    // workspace(Cloud)와 project(Server)가 서로 다른 값으로 동시에 지정되면
    // 어느 API 계열인지 단정할 수 없다.
    if let (Some(ws), Some(proj)) = (&workspace, &project)
        && ws != proj
    {
        return Err(Error::Configuration(format!(
            "both repository.workspace ({ws}) and repository.project ({proj}) are set; \
             remove one to pick Cloud or Server"
        )));
    }

    if let Some(repo) = &repo {
        if let Some(ws) = &workspace {
            return Ok(RepoCoordinates {
                kind: ApiKind::Cloud,
                workspace_or_project: ws.clone(),
                repo: repo.clone(),
                base_branch,
                merge_branch,
                api_base: CLOUD_API_BASE.to_string(),
            });
        }

        if let Some(proj) = &project {
            let Some(base_url) = trimmed(repo_cfg.base_url.as_deref()) else {
                return Err(Error::Configuration(
                    "repository.project is set but repository.base_url is missing; \
                     set the Bitbucket Server host URL"
                        .to_string(),
                ));
            };
            return Ok(RepoCoordinates {
                kind: ApiKind::Server,
                workspace_or_project: proj.clone(),
                repo: repo.clone(),
                base_branch,
                merge_branch,
                api_base: format!("{}/rest/api/1.0", base_url.trim_end_matches('/')),
            });
        }
    }

    if workspace.is_some() || project.is_some() {
        return Err(Error::Configuration(
            "repository.workspace/project is set but repository.repo is missing".to_string(),
        ));
    }

    let Some(url) = remote_url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Err(Error::Configuration(
            "no repository coordinates configured and no git remote available; \
             set repository.{workspace|project}/repo or run inside a Bitbucket clone"
                .to_string(),
        ));
    };

    let remote = parse_remote_url(url).ok_or_else(|| {
        Error::Configuration(format!("remote URL is not a recognizable Bitbucket remote: {url}"))
    })?;

    Ok(RepoCoordinates {
        kind: remote.kind,
        workspace_or_project: remote.workspace_or_project,
        repo: remote.repo,
        base_branch,
        merge_branch,
        api_base: remote.api_base,
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
