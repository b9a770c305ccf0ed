//! Interface layer
//! 외부 입력(CLI)과 의존성 조립을 담당한다.

pub mod cli;
pub mod composition;

pub use composition::AppComposition;
