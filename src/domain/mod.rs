//! Domain layer
//! 비즈니스 규칙(저장소 좌표/PR/diff/중복 방지 정책)을 외부 의존성 없이 표현한다.

pub mod coords;
pub mod dedupe;
pub mod diff;
pub mod error;
pub mod policy;
pub mod pr;
