//! Jira 연동 구현.

mod adf;
mod client;

pub use client::JiraClient;
