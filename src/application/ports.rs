//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::coords::RepoCoordinates;
use crate::domain::error::Error;
use crate::domain::pr::{CommentDraft, ExistingComment, PullRequestRef, StoryDetails};
use crate::infrastructure::config::Config;

/// 설정 로딩/점검을 담당하는 저장소 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// Basic 자격 증명(base64(username:secret)) 저장소 포트.
/// 핵심 클라이언트는 호스트 비밀 저장소 API를 직접 호출하지 않는다.
pub trait CredentialStore: Send + Sync {
    /// 저장된(또는 환경에서 유도된) base64 토큰.
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, username: &str, secret: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// 로컬 git 저장소 상태(현재 브랜치, remote URL) 조회 포트.
pub trait BranchInspector: Send + Sync {
    fn current_branch(&self) -> Result<String>;
    fn remote_url(&self) -> Result<Option<String>>;
}

/// Bitbucket PR API 추상화 포트. Cloud/Server 구현이 좌표 해석 시점에
/// 한 번 선택되고, 호출부는 이 인터페이스에만 의존한다.
#[async_trait]
pub trait PrGateway: Send + Sync {
    /// (source, target) 브랜치 쌍으로 열린 PR을 찾는다.
    /// 매치 없음은 None이지 오류가 아니다.
    async fn find_pr(&self, source: &str, target: &str) -> Result<Option<PullRequestRef>, Error>;
    async fn create_pr(
        &self,
        source: &str,
        target: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<PullRequestRef, Error>;
    /// unified diff 원문. JSON으로 감싼 Server 응답은 구현에서 특수 처리한다.
    async fn fetch_diff(&self, pr_id: u64) -> Result<String, Error>;
    /// 모든 페이지를 이어붙인 기존 코멘트 목록.
    async fn list_comments(&self, pr_id: u64) -> Result<Vec<ExistingComment>, Error>;
    async fn post_comment(&self, pr_id: u64, draft: &CommentDraft) -> Result<(), Error>;
}

/// 좌표/자격 증명에 맞는 PR 게이트웨이를 생성하는 팩토리 포트.
pub trait BackendFactory: Send + Sync {
    fn build(
        &self,
        coords: &RepoCoordinates,
        credential: Option<String>,
        config: &Config,
    ) -> Box<dyn PrGateway>;
}

/// Jira 이슈 조회 포트.
#[async_trait]
pub trait IssueGateway: Send + Sync {
    async fn fetch_story(&self, key: &str) -> Result<StoryDetails, Error>;
}

/// 설정에 Jira 연동이 있을 때만 게이트웨이를 생성하는 팩토리 포트.
pub trait IssueFactory: Send + Sync {
    fn build(&self, config: &Config, credential: Option<String>)
    -> Result<Option<Box<dyn IssueGateway>>>;
}

/// 콘솔/로그 출력 추상화 포트.
pub trait Reporter: Send + Sync {
    fn section(&self, name: &str);
    fn kv(&self, key: &str, value: &str);
    fn status(&self, scope: &str, message: &str);
    fn raw(&self, line: &str);
}

/// PR 생성 등 되돌리기 어려운 동작 전 사용자 확인 포트.
pub trait UserConfirmer: Send + Sync {
    fn confirm(&self, message: &str) -> Result<bool>;
}
