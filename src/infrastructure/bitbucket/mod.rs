//! Bitbucket API 연동 구현(Cloud/Server).

mod cloud;
mod server;

pub use cloud::CloudBackend;
pub use server::ServerBackend;

use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;

pub(crate) const USER_AGENT: &str = "bbpilot";

/// 두 백엔드가 공유하는 요청 빌더. Basic 인증 헤더와 공통 헤더를 적용한다.
pub(crate) fn request(
    client: &Client,
    method: Method,
    url: String,
    credential: Option<&str>,
) -> RequestBuilder {
    let req = client
        .request(method, url)
        .header("User-Agent", USER_AGENT);

    match credential {
        Some(token) => req.header("Authorization", format!("Basic {token}")),
        None => req,
    }
}

/// 일부 Server 배포본은 diff를 JSON으로 감싸 돌려준다.
/// 최상위 `diff` 문자열이 있으면 꺼내고, 아니면 본문을 그대로 쓴다.
pub(crate) fn unwrap_json_diff(body: &str) -> String {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return body.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => match value.get("diff").and_then(Value::as_str) {
            Some(diff) => diff.to_string(),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
