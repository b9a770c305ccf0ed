//! 병합된 설정 상태를 사람이 읽을 수 있게 보여주는 유스케이스.

use anyhow::{Context, Result};

use crate::application::ports::{ConfigRepository, Reporter};

pub struct InspectConfigUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub reporter: &'a dyn Reporter,
}

impl InspectConfigUseCase<'_> {
    /// `bbpilot config` 명령 진입점. 탐색 경로와 병합 결과를 JSON으로 출력한다.
    pub fn execute(&self) -> Result<()> {
        let rendered = self
            .config_repo
            .inspect_pretty_json()
            .context("failed to inspect bbpilot config")?;
        self.reporter.section("Config");
        self.reporter.raw(&rendered);
        Ok(())
    }
}
