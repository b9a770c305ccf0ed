//! 유스케이스 모듈 묶음.

pub mod ensure_pr;
pub mod fetch_story;
pub mod inspect_config;
pub mod post_comments;
mod session;
pub mod show_diff;
