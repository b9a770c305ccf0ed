//! PR 게이트웨이 팩토리 포트 구현 어댑터.

use crate::application::ports::{BackendFactory, PrGateway};
use crate::domain::coords::{ApiKind, RepoCoordinates};
use crate::infrastructure::bitbucket::{CloudBackend, ServerBackend};
use crate::infrastructure::config::Config;
use crate::infrastructure::http::ApiTransport;

/// 좌표 해석 시점에 Cloud/Server 구현을 한 번만 고른다.
pub struct BitbucketBackendFactory;

impl BackendFactory for BitbucketBackendFactory {
    fn build(
        &self,
        coords: &RepoCoordinates,
        credential: Option<String>,
        config: &Config,
    ) -> Box<dyn PrGateway> {
        let transport = ApiTransport::new(config.max_retries(), config.rate_limit_per_minute());

        match coords.kind {
            ApiKind::Cloud => Box::new(CloudBackend::new(
                coords.api_base.clone(),
                coords.workspace_or_project.clone(),
                coords.repo.clone(),
                credential,
                transport,
            )),
            ApiKind::Server => Box::new(ServerBackend::new(
                coords.api_base.clone(),
                coords.workspace_or_project.clone(),
                coords.repo.clone(),
                credential,
                transport,
            )),
        }
    }
}
