//! 설정 파일 탐색/병합 로더.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use super::types::Config;

#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    pub config: Config,
    pub searched_paths: Vec<PathBuf>,
    pub loaded_paths: Vec<PathBuf>,
}

/// 우선순위 경로를 순회해 JSON 설정을 병합한다.
pub(crate) fn load_merged_config() -> Result<LoadedConfig> {
    // 낮은 우선순위에서 높은 우선순위 순서로 병합한다.
    let mut merged = Config::default();
    let mut loaded_paths = Vec::new();
    let paths = config_paths();

    for path in &paths {
        if !path.exists() {
            continue;
        }
        merged.merge_from(read_config_file(path)?);
        loaded_paths.push(path.to_path_buf());
    }

    if loaded_paths.is_empty() {
        // 최초 실행 경험을 위해 로컬 기본 설정 템플릿을 자동 생성한다.
        let bootstrap_target = default_bootstrap_config_path();
        write_template(&bootstrap_target)?;
        merged.merge_from(read_config_file(&bootstrap_target)?);
        loaded_paths.push(bootstrap_target);
    }

    Ok(LoadedConfig {
        config: merged,
        searched_paths: paths,
        loaded_paths,
    })
}

/// 기본 + 사용자 + 프로젝트 + 명시 경로 순으로 병합 경로를 구성한다.
pub fn config_paths() -> Vec<PathBuf> {
    // 낮은 우선순위 -> 높은 우선순위 순서로 병합됨.
    let mut paths = vec![PathBuf::from("/etc/bbpilot/config.json")];

    if let Some(base) = dirs::config_dir() {
        paths.push(base.join("bbpilot").join("config.json"));
    }

    paths.push(PathBuf::from(".bbpilot/config.json"));

    if let Ok(path) = env::var("BBPILOT_CONFIG") {
        paths.push(Path::new(&path).to_path_buf());
    }

    dedup_paths(paths)
}

pub(super) fn read_config_file(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))
}

fn default_bootstrap_config_path() -> PathBuf {
    if let Ok(path) = env::var("BBPILOT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(".bbpilot/config.json")
}

fn write_template(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        return Ok(());
    }

    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let template = json!({
        "defaults": {
            "base_branch": "main",
            "merge_branch": null,
            "comment_style": "default",
            "max_retries": 3,
            "rate_limit_per_minute": 10
        },
        "repository": {
            "workspace": null,
            "project": null,
            "repo": null,
            "base_url": null
        },
        "jira": {
            "base_url": null,
            "story_field": "customfield_10041"
        }
    });

    let rendered = serde_json::to_string_pretty(&template)?;
    fs::write(config_path, format!("{rendered}\n"))
        .with_context(|| format!("failed to create config template at {}", config_path.display()))
}

fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for p in paths {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_parses_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"defaults": {"base_branch": "develop"}, "repository": {"project": "PROJ", "repo": "widgets"}}"#,
        )
        .unwrap();

        let config = read_config_file(&path).unwrap();
        assert_eq!(config.base_branch(), "develop");
        assert_eq!(config.repository.project.as_deref(), Some("PROJ"));
    }

    #[test]
    fn invalid_json_surfaces_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_config_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.json"));
    }

    #[test]
    fn template_bootstrap_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        write_template(&path).unwrap();
        let config = read_config_file(&path).unwrap();

        assert_eq!(config.base_branch(), "main");
        assert_eq!(config.rate_limit_per_minute(), 10);
    }
}
