//! bbpilot library root.
//! Clean Architecture + DDD 계층을 외부에 노출한다.

use anyhow::Result;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

use interface::AppComposition;

/// 설정 점검 JSON 출력용 함수.
pub fn inspect_config_pretty_json() -> Result<String> {
    infrastructure::config::Config::inspect_pretty_json()
}

/// 라이브러리 직접 호출용: 현재 브랜치 PR에 일반 코멘트 한 건을 게시한다.
pub async fn post_general_comment(body: &str) -> Result<()> {
    let composition = AppComposition::default();
    composition
        .post_comments_usecase(true)
        .execute(vec![domain::pr::CommentDraft::general(body)], None)
        .await?;
    Ok(())
}
