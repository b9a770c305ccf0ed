//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod backend_factory;
mod config_repository;
mod credential_store;
mod git_branch;
mod issue_factory;
mod reporter;
mod user_confirmer;

pub use backend_factory::BitbucketBackendFactory;
pub use config_repository::JsonConfigRepository;
pub use credential_store::FileCredentialStore;
pub use git_branch::GitBranchInspector;
pub use issue_factory::JiraIssueFactory;
pub use reporter::ConsoleReporter;
pub use user_confirmer::{AutoConfirmer, StdinConfirmer};
