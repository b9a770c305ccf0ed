//! 적용 설정 진단(inspection) 뷰 모델.

use serde::Serialize;

use super::loader::LoadedConfig;
use super::types::{DefaultsConfig, RepositoryConfig};

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub defaults: DefaultsConfig,
    pub effective_defaults: EffectiveDefaults,
    pub repository: RepositoryConfig,
    pub jira: JiraInspection,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveDefaults {
    pub base_branch: String,
    pub comment_style: String,
    pub max_retries: u32,
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct JiraInspection {
    pub configured: bool,
    pub base_url: Option<String>,
    pub story_field: String,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig) -> Self {
        let config = &loaded.config;
        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            defaults: config.defaults.clone(),
            effective_defaults: EffectiveDefaults {
                base_branch: config.base_branch(),
                comment_style: config.comment_style().code().to_string(),
                max_retries: config.max_retries(),
                rate_limit_per_minute: config.rate_limit_per_minute(),
            },
            repository: config.repository.clone(),
            jira: JiraInspection {
                configured: config.jira.is_configured(),
                base_url: config.jira.base_url.clone(),
                story_field: config.jira.story_field(),
            },
        }
    }
}
