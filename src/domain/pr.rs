//! PR/코멘트 도메인 엔티티/값 객체.

/// PR 상태. API 계열과 무관한 공통 표현.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Merged,
    Declined,
}

impl PrState {
    /// API 응답의 state 문자열을 해석한다. 알 수 없는 값은 Open으로 둔다.
    pub fn from_api(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_uppercase).as_deref() {
            Some("MERGED") => Self::Merged,
            Some("DECLINED") => Self::Declined,
            _ => Self::Open,
        }
    }
}

/// (source, target) 브랜치 쌍으로 조회/생성되는 PR 참조.
#[derive(Debug, Clone)]
pub struct PullRequestRef {
    pub id: u64,
    pub source_branch: String,
    pub target_branch: String,
    pub state: PrState,
    pub web_url: String,
}

/// 게시 대기 중인 코멘트 초안. 게시 호출 이후에는 보존되지 않는다.
/// `target_path`가 없으면 PR 전체 대상 일반 코멘트다.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub target_path: Option<String>,
    pub anchor_line: Option<u32>,
    pub body: String,
}

impl CommentDraft {
    pub fn general(body: impl Into<String>) -> Self {
        Self {
            target_path: None,
            anchor_line: None,
            body: body.into(),
        }
    }

    pub fn inline(path: impl Into<String>, line: u32, body: impl Into<String>) -> Self {
        Self {
            target_path: Some(path.into()),
            anchor_line: Some(line),
            body: body.into(),
        }
    }
}

/// PR에 이미 달려 있는 코멘트의 정규화 표현.
/// Cloud(`content.raw`/`inline`)와 Server(`text`/`anchor`) 형태 차이를 흡수한 결과다.
#[derive(Debug, Clone)]
pub struct ExistingComment {
    pub path: Option<String>,
    pub line: Option<u32>,
    pub text: String,
}

/// Jira 이슈에서 읽어 온 스토리 정보.
#[derive(Debug, Clone)]
pub struct StoryDetails {
    pub key: String,
    pub text: String,
}

/// 경로 구분자를 POSIX 형태로 정규화한다. 중복 서명 비교의 전제 조건.
pub fn to_posix_path(path: &str) -> String {
    path.replace('\\', "/")
}
