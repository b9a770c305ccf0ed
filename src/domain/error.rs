//! 클라이언트 공통 오류 분류.

use thiserror::Error;

/// Bitbucket/Jira 연동 전 구간에서 사용하는 오류 타입.
/// 재시도/자격 증명 무효화 판단은 variant 단위로 이뤄진다.
#[derive(Debug, Error)]
pub enum Error {
    /// 저장소 좌표를 확정할 수 없는 상태. 설정 수정으로만 해결된다.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 401 응답. 저장된 자격 증명을 지우고 재인증을 요구한다.
    #[error("authentication rejected (401): {0}")]
    Authentication(String),

    /// 재시도 예산을 소진한 429 응답.
    #[error("rate limited after {attempts} attempts: {body}")]
    RateLimited { attempts: u32, body: String },

    /// 그 외 non-2xx 응답. 상태 코드와 본문을 그대로 전달한다.
    #[error("remote call failed ({status}): {body}")]
    Remote { status: u16, body: String },

    /// 네트워크 전송 오류(타임아웃/DNS/연결 끊김). 5xx와 동일하게 재시도된다.
    #[error("transport error: {0}")]
    Transport(String),

    /// 인식 불가능한 응답 형태. 호출자는 빈 결과로 degrade한다.
    #[error("parse anomaly: {0}")]
    ParseAnomaly(String),
}
