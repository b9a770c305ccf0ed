//! SHA-1 서명 기반 코멘트 중복 방지 저장소.
//!
//! 서명은 원문 텍스트 그대로 해시한다. 공백 차이도 다른 서명이 된다
//! (관찰된 기존 동작을 그대로 유지).

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use sha1::{Digest, Sha1};

use crate::domain::pr::{CommentDraft, ExistingComment, to_posix_path};

/// PR별 기존 서명 캐시의 기본 유효 기간.
pub const EXISTING_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// (prId, path, line, body)를 하나의 중복 판정 키로 축약한다.
pub fn signature_for(pr_id: u64, path: Option<&str>, line: Option<u32>, body: &str) -> String {
    let normalized_path = path.map(to_posix_path).unwrap_or_default();
    let target = format!(
        "{pr_id}|{normalized_path}|{}|{body}",
        line.unwrap_or(0)
    );

    let mut hasher = Sha1::new();
    hasher.update(target.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn signature_of_draft(pr_id: u64, draft: &CommentDraft) -> String {
    signature_for(pr_id, draft.target_path.as_deref(), draft.anchor_line, &draft.body)
}

pub fn signature_of_existing(pr_id: u64, comment: &ExistingComment) -> String {
    signature_for(pr_id, comment.path.as_deref(), comment.line, &comment.text)
}

struct CachedSignatures {
    loaded_at: Instant,
    signatures: HashSet<String>,
}

/// 클라이언트 인스턴스 단위의 중복 방지 상태.
/// (모듈 전역 캐시 대신 명시적으로 주입해 테스트 간 간섭을 없앤다.)
pub struct DeduplicationStore {
    ttl: Duration,
    existing_by_pr: HashMap<u64, CachedSignatures>,
    posted: HashSet<String>,
}

impl Default for DeduplicationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeduplicationStore {
    pub fn new() -> Self {
        Self::with_ttl(EXISTING_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            existing_by_pr: HashMap::new(),
            posted: HashSet::new(),
        }
    }

    /// 해당 PR의 기존 서명 집합을 다시 로딩해야 하는지 판단한다.
    pub fn needs_refresh(&self, pr_id: u64) -> bool {
        match self.existing_by_pr.get(&pr_id) {
            Some(cached) => cached.loaded_at.elapsed() >= self.ttl,
            None => true,
        }
    }

    /// PR의 기존 코멘트에서 계산한 서명 집합으로 캐시를 교체한다.
    pub fn replace_existing(&mut self, pr_id: u64, signatures: impl IntoIterator<Item = String>) {
        self.existing_by_pr.insert(
            pr_id,
            CachedSignatures {
                loaded_at: Instant::now(),
                signatures: signatures.into_iter().collect(),
            },
        );
    }

    /// (기존 서명 ∪ 세션 내 게시 서명)에 대한 포함 여부.
    pub fn is_duplicate(&self, pr_id: u64, signature: &str) -> bool {
        if self.posted.contains(signature) {
            return true;
        }
        self.existing_by_pr
            .get(&pr_id)
            .is_some_and(|cached| cached.signatures.contains(signature))
    }

    /// 게시가 실제로 성공한 뒤에만 호출한다.
    /// 실패한 게시가 서명을 남기면 중복 방지 상태가 오염된다.
    pub fn record_posted(&mut self, pr_id: u64, signature: String) {
        if let Some(cached) = self.existing_by_pr.get_mut(&pr_id) {
            cached.signatures.insert(signature.clone());
        }
        self.posted.insert(signature);
    }

    pub fn clear(&mut self) {
        self.existing_by_pr.clear();
        self.posted.clear();
    }
}
