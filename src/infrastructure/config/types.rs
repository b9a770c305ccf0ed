//! 설정 스키마와 병합 규칙.

use serde::{Deserialize, Serialize};

use crate::domain::policy::CommentStyle;

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;
pub const DEFAULT_STORY_FIELD: &str = "customfield_10041";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 전역 기본값
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// 대상 저장소 좌표(명시값, remote 자동 감지보다 우선)
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Jira 연동 설정(선택)
    #[serde(default)]
    pub jira: JiraConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DefaultsConfig {
    /// PR target 브랜치
    pub base_branch: Option<String>,
    /// PR source 브랜치 고정값. 비어 있으면 현재 git 브랜치를 쓴다.
    pub merge_branch: Option<String>,
    /// 코멘트 템플릿 스타일(default/concise/professional)
    pub comment_style: Option<String>,
    /// 재시도 가능한 호출의 최대 시도 횟수
    pub max_retries: Option<u32>,
    /// 분당 요청 상한(0이면 비활성화)
    pub rate_limit_per_minute: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RepositoryConfig {
    /// Cloud workspace 이름
    pub workspace: Option<String>,
    /// Server/Data Center project key
    pub project: Option<String>,
    pub repo: Option<String>,
    /// Server 호스트 베이스 URL(예: https://bitbucket.example.com)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct JiraConfig {
    /// Jira 베이스 URL. 비어 있으면 Jira 연동 자체가 꺼진 것으로 본다.
    pub base_url: Option<String>,
    /// 인수 조건이 담긴 커스텀 필드 id
    pub story_field: Option<String>,
}

impl Config {
    pub fn base_branch(&self) -> String {
        self.defaults
            .base_branch
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string())
    }

    /// PR source 브랜치 고정값. 공백뿐인 값은 미설정으로 본다.
    pub fn merge_branch(&self) -> Option<String> {
        self.defaults
            .merge_branch
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn comment_style(&self) -> CommentStyle {
        CommentStyle::from_config(self.defaults.comment_style.as_deref())
    }

    pub fn max_retries(&self) -> u32 {
        self.defaults.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// 분당 요청 상한. 0은 비활성화를 뜻한다.
    pub fn rate_limit_per_minute(&self) -> u32 {
        self.defaults
            .rate_limit_per_minute
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE)
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.defaults.merge_from(other.defaults);
        self.repository.merge_from(other.repository);
        self.jira.merge_from(other.jira);
    }
}

impl DefaultsConfig {
    pub(crate) fn merge_from(&mut self, other: DefaultsConfig) {
        if other.base_branch.is_some() {
            self.base_branch = other.base_branch;
        }
        if other.merge_branch.is_some() {
            self.merge_branch = other.merge_branch;
        }
        if other.comment_style.is_some() {
            self.comment_style = other.comment_style;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.rate_limit_per_minute.is_some() {
            self.rate_limit_per_minute = other.rate_limit_per_minute;
        }
    }
}

impl RepositoryConfig {
    pub(crate) fn merge_from(&mut self, other: RepositoryConfig) {
        if other.workspace.is_some() {
            self.workspace = other.workspace;
        }
        if other.project.is_some() {
            self.project = other.project;
        }
        if other.repo.is_some() {
            self.repo = other.repo;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
    }
}

impl JiraConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn story_field(&self) -> String {
        self.story_field
            .clone()
            .unwrap_or_else(|| DEFAULT_STORY_FIELD.to_string())
    }

    pub(crate) fn merge_from(&mut self, other: JiraConfig) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.story_field.is_some() {
            self.story_field = other.story_field;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_values_win_on_merge() {
        let mut base: Config = serde_json::from_str(
            r#"{"defaults": {"base_branch": "main", "max_retries": 5}}"#,
        )
        .unwrap();
        let overlay: Config = serde_json::from_str(
            r#"{"defaults": {"base_branch": "develop"}, "repository": {"workspace": "acme"}}"#,
        )
        .unwrap();

        base.merge_from(overlay);

        assert_eq!(base.base_branch(), "develop");
        assert_eq!(base.max_retries(), 5);
        assert_eq!(base.repository.workspace.as_deref(), Some("acme"));
    }

    #[test]
    fn merge_branch_is_optional_and_ignores_blank_values() {
        let config: Config =
            serde_json::from_str(r#"{"defaults": {"merge_branch": "release/1.2"}}"#).unwrap();
        assert_eq!(config.merge_branch().as_deref(), Some("release/1.2"));

        let blank: Config = serde_json::from_str(r#"{"defaults": {"merge_branch": "  "}}"#).unwrap();
        assert_eq!(blank.merge_branch(), None);
        assert_eq!(Config::default().merge_branch(), None);
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::default();
        assert_eq!(config.base_branch(), "main");
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.rate_limit_per_minute(), DEFAULT_RATE_LIMIT_PER_MINUTE);
        assert!(!config.jira.is_configured());
        assert_eq!(config.jira.story_field(), DEFAULT_STORY_FIELD);
    }
}
