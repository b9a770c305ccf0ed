//! 로컬 git 상태 조회 포트 구현 어댑터.

use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::application::ports::BranchInspector;

/// `git` CLI를 통해 현재 브랜치와 origin remote를 읽는다.
pub struct GitBranchInspector;

impl GitBranchInspector {
    fn git_stdout(args: &[&str]) -> Result<Option<String>> {
        let output = Command::new("git")
            .args(args)
            .output()
            .context("failed to run git")?;
        if !output.status.success() {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

impl BranchInspector for GitBranchInspector {
    fn current_branch(&self) -> Result<String> {
        match Self::git_stdout(&["rev-parse", "--abbrev-ref", "HEAD"])? {
            Some(branch) => Ok(branch),
            None => bail!("not inside a git repository (or HEAD is unborn)"),
        }
    }

    fn remote_url(&self) -> Result<Option<String>> {
        // remote가 없는 저장소도 정상 상태다. 좌표는 설정으로 해석된다.
        Self::git_stdout(&["remote", "get-url", "origin"])
    }
}
