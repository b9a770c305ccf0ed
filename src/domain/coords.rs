//! git remote URL을 Bitbucket Cloud/Server 저장소 좌표로 해석하는 모듈.

use std::sync::OnceLock;

use regex::Regex;

/// Cloud(`api.bitbucket.org/2.0`)와 Server/Data Center(`<host>/rest/api/1.0`)는
/// 인증 범위, payload 형태, 페이지네이션 규칙이 모두 다른 별개의 API 계열이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    Cloud,
    Server,
}

impl ApiKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Server => "server",
        }
    }
}

/// 한 세션에서 사용할 저장소 좌표. 해석 이후 불변이며 호출마다 다시 해석한다.
#[derive(Debug, Clone)]
pub struct RepoCoordinates {
    pub kind: ApiKind,
    /// Cloud는 workspace, Server는 project key.
    pub workspace_or_project: String,
    pub repo: String,
    pub base_branch: String,
    /// 설정으로 고정한 PR source 브랜치. 없으면 현재 git 브랜치를 쓴다.
    pub merge_branch: Option<String>,
    pub api_base: String,
}

/// remote URL에서 추출한 부분 좌표. base branch는 설정에서 온다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCoordinates {
    pub kind: ApiKind,
    pub workspace_or_project: String,
    pub repo: String,
    pub api_base: String,
}

pub const CLOUD_API_BASE: &str = "https://api.bitbucket.org/2.0";

/// remote URL 패턴을 보고 Cloud/Server 좌표를 자동 감지한다.
/// Cloud 패턴(bitbucket.org)을 먼저 시도하고, 그 다음 Server 패턴을 본다.
pub fn parse_remote_url(remote_url: &str) -> Option<RemoteCoordinates> {
    let trimmed = remote_url.trim();

    if let Some(coords) = parse_cloud(trimmed) {
        return Some(coords);
    }

    parse_server(trimmed)
}

fn parse_cloud(url: &str) -> Option<RemoteCoordinates> {
    static SSH: OnceLock<Regex> = OnceLock::new();
    static HTTPS: OnceLock<Regex> = OnceLock::new();

    // git@bitbucket.org:workspace/repo.git (slug의 점은 허용, .git 접미만 제거)
    let ssh = SSH.get_or_init(|| {
        Regex::new(r"^git@bitbucket\.org:([^/]+)/([^/]+?)(?:\.git)?$").unwrap()
    });
    // https://[username@]bitbucket.org/workspace/repo[.git]
    let https = HTTPS.get_or_init(|| {
        Regex::new(r"^https://(?:[^@/]+@)?bitbucket\.org/([^/]+)/([^/]+?)(?:\.git)?/?$").unwrap()
    });

    let caps = ssh.captures(url).or_else(|| https.captures(url))?;

    Some(RemoteCoordinates {
        kind: ApiKind::Cloud,
        workspace_or_project: caps[1].to_string(),
        repo: caps[2].to_string(),
        api_base: CLOUD_API_BASE.to_string(),
    })
}

fn parse_server(url: &str) -> Option<RemoteCoordinates> {
    static SSH: OnceLock<Regex> = OnceLock::new();
    static HTTPS: OnceLock<Regex> = OnceLock::new();

    // git@bitbucket.example.com:PROJ/repo.git (ssh:// 접두와 포트 허용)
    let ssh = SSH.get_or_init(|| {
        Regex::new(r"^(?:ssh://)?git@([^:/]+)(?::\d+)?[:/]([^/]+)/([^/]+?)(?:\.git)?$").unwrap()
    });
    // https://[username@]bitbucket.example.com/[scm/]PROJ/repo[.git]
    let https = HTTPS.get_or_init(|| {
        Regex::new(r"^https://(?:[^@/]+@)?([^/]+?)(?::\d+)?/(?:scm/)?([^/]+)/([^/]+?)(?:\.git)?/?$")
            .unwrap()
    });

    let caps = ssh.captures(url).or_else(|| https.captures(url))?;
    let host = &caps[1];

    Some(RemoteCoordinates {
        kind: ApiKind::Server,
        workspace_or_project: caps[2].to_string(),
        repo: caps[3].to_string(),
        api_base: format!("https://{host}/rest/api/1.0"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cloud_ssh_remote() {
        let coords = parse_remote_url("git@bitbucket.org:acme/widgets.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Cloud);
        assert_eq!(coords.workspace_or_project, "acme");
        assert_eq!(coords.repo, "widgets");
        assert_eq!(coords.api_base, CLOUD_API_BASE);
    }

    #[test]
    fn parses_cloud_https_with_embedded_username() {
        let coords = parse_remote_url("https://dev@bitbucket.org/acme/widgets.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Cloud);
        assert_eq!(coords.workspace_or_project, "acme");
        assert_eq!(coords.repo, "widgets");
    }

    #[test]
    fn parses_cloud_https_without_username_or_suffix() {
        let coords = parse_remote_url("https://bitbucket.org/acme/widgets").unwrap();
        assert_eq!(coords.kind, ApiKind::Cloud);
        assert_eq!(coords.repo, "widgets");
    }

    #[test]
    fn parses_server_ssh_remote_and_strips_port() {
        let coords = parse_remote_url("ssh://git@bitbucket.example.com:7999/proj/repo.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Server);
        assert_eq!(coords.workspace_or_project, "proj");
        assert_eq!(coords.repo, "repo");
        assert_eq!(coords.api_base, "https://bitbucket.example.com/rest/api/1.0");
    }

    #[test]
    fn parses_server_https_with_scm_segment() {
        let coords =
            parse_remote_url("https://bitbucket.example.com/scm/proj/repo.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Server);
        assert_eq!(coords.workspace_or_project, "proj");
        assert_eq!(coords.repo, "repo");
    }

    #[test]
    fn cloud_host_never_matches_as_server() {
        // bitbucket.org는 Server 패턴에도 걸릴 수 있으므로 Cloud 우선이 보장되어야 한다.
        let coords = parse_remote_url("https://bitbucket.org/acme/widgets.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Cloud);
    }

    #[test]
    fn cloud_slug_may_contain_dots() {
        let coords = parse_remote_url("git@bitbucket.org:acme/my.repo.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Cloud);
        assert_eq!(coords.repo, "my.repo");

        let coords = parse_remote_url("https://bitbucket.org/acme/my.repo").unwrap();
        assert_eq!(coords.repo, "my.repo");
    }

    #[test]
    fn server_slug_may_contain_dots() {
        let coords =
            parse_remote_url("https://bitbucket.example.com/scm/proj/svc.api.git").unwrap();
        assert_eq!(coords.kind, ApiKind::Server);
        assert_eq!(coords.workspace_or_project, "proj");
        assert_eq!(coords.repo, "svc.api");

        let coords =
            parse_remote_url("ssh://git@bitbucket.example.com:7999/proj/svc.api.git").unwrap();
        assert_eq!(coords.repo, "svc.api");
    }

    #[test]
    fn unrecognized_remote_yields_none() {
        assert!(parse_remote_url("file:///srv/repos/widgets.git").is_none());
        assert!(parse_remote_url("").is_none());
    }
}
