//! Basic 자격 증명 저장소 포트 구현 어댑터.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::application::ports::CredentialStore;

const EMAIL_ENV: &str = "BITBUCKET_EMAIL";
const TOKEN_ENV: &str = "BITBUCKET_TOKEN";

/// 설정 디렉터리의 단일 파일에 base64(username:secret)를 보관한다.
/// 환경변수 쌍이 있으면 파일보다 우선한다.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCredentialStore {
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".bbpilot"));
        Self {
            path: base.join("bbpilot").join("credential"),
        }
    }

    #[cfg(test)]
    fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn env_credential() -> Option<String> {
        let email = env::var(EMAIL_ENV).ok()?;
        let token = env::var(TOKEN_ENV).ok()?;
        if email.trim().is_empty() || token.trim().is_empty() {
            return None;
        }
        Some(encode(email.trim(), token.trim()))
    }
}

fn encode(username: &str, secret: &str) -> String {
    STANDARD.encode(format!("{username}:{secret}"))
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>> {
        if let Some(token) = Self::env_credential() {
            return Ok(Some(token));
        }

        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read credential at {}", self.path.display()))?;
        let token = raw.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    fn set(&self, username: &str, secret: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&self.path, format!("{}\n", encode(username, secret)))
            .with_context(|| format!("failed to write credential at {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("failed to restrict {}", self.path.display()))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove credential at {}", self.path.display()))?;
        }
        Ok(())
    }
}
