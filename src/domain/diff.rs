//! unified diff 텍스트를 파일 단위 chunk로 쪼개는 구조 분리기.
//!
//! hunk 의미(라인 번호 계산, 추가/삭제 분류)는 해석하지 않는다.
//! 표준 `a/...`/`b/...` 헤더와 일부 Server 배포판이 쓰는
//! `src://`/`dst://` 접두 헤더를 모두 허용한다.

use std::sync::OnceLock;

use regex::Regex;

/// 한 파일에 속하는 diff 원문 라인 묶음. 파일 등장 순서 그대로 생성되며
/// 병합/재정렬되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffChunk {
    /// destination 쪽 파일 경로.
    pub file_path: String,
    pub lines: Vec<String>,
}

/// 파일 헤더 매칭 결과. fallback 분기를 숨기지 않도록 tagged로 반환한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMatch {
    Matched { path: String },
    Unmatched,
}

/// `diff --git` 라인에서 destination 경로를 추출한다.
pub fn match_file_header(line: &str) -> HeaderMatch {
    static VENDOR: OnceLock<Regex> = OnceLock::new();
    static STANDARD: OnceLock<Regex> = OnceLock::new();

    let vendor = VENDOR
        .get_or_init(|| Regex::new(r"^diff --git src://(.+?) dst://(.+)$").unwrap());
    let standard = STANDARD
        .get_or_init(|| Regex::new(r"^diff --git a/(.+?) b/(.+)$").unwrap());

    if let Some(caps) = vendor.captures(line) {
        return HeaderMatch::Matched {
            path: caps[2].to_string(),
        };
    }
    if let Some(caps) = standard.captures(line) {
        return HeaderMatch::Matched {
            path: caps[2].to_string(),
        };
    }
    HeaderMatch::Unmatched
}

/// diff 원문을 파일 단위 chunk 시퀀스로 변환한다.
/// 빈 입력과 헤더 없는 입력은 빈 시퀀스를 낳는다("변경 없음"이지 오류가 아니다).
pub fn parse_chunks(raw_diff: &str) -> Vec<DiffChunk> {
    let mut chunks: Vec<DiffChunk> = Vec::new();
    let mut current: Option<DiffChunk> = None;
    // 헤더가 경로를 싣지 못한 경우를 위한 잠정 경로.
    let mut provisional_path: Option<String> = None;

    for line in raw_diff.lines() {
        if line.starts_with("diff --git") {
            if let Some(chunk) = current.take()
                && !chunk.lines.is_empty()
            {
                chunks.push(chunk);
            }

            match match_file_header(line) {
                HeaderMatch::Matched { path } => {
                    provisional_path = Some(path.clone());
                    current = Some(DiffChunk {
                        file_path: path,
                        lines: vec![line.to_string()],
                    });
                }
                HeaderMatch::Unmatched => {
                    // 알 수 없는 헤더 형태. 다음 marker 라인이 나올 때까지 버린다.
                    provisional_path = None;
                }
            }
            continue;
        }

        if line.starts_with("+++") {
            if let Some(chunk) = current.as_mut() {
                chunk.lines.push(line.to_string());
            }
            // destination marker는 잠정 파일명을 덮어쓴다.
            if let Some(dst) = line.strip_prefix("+++ dst://") {
                let path = dst.to_string();
                match current.as_mut() {
                    Some(chunk) => {
                        if chunk.file_path != path {
                            chunk.file_path = path.clone();
                        }
                    }
                    None => {
                        current = Some(DiffChunk {
                            file_path: path.clone(),
                            lines: vec![line.to_string()],
                        });
                    }
                }
                provisional_path = Some(path);
            }
            continue;
        }

        if line.starts_with("---") {
            if let Some(chunk) = current.as_mut() {
                chunk.lines.push(line.to_string());
            }
            if provisional_path.is_none()
                && let Some(src) = line.strip_prefix("--- src://")
            {
                provisional_path = Some(src.to_string());
            }
            continue;
        }

        if line.starts_with("@@") {
            match current.as_mut() {
                Some(chunk) => chunk.lines.push(line.to_string()),
                None => {
                    if let Some(path) = provisional_path.clone() {
                        current = Some(DiffChunk {
                            file_path: path,
                            lines: vec![line.to_string()],
                        });
                    }
                }
            }
            continue;
        }

        if let Some(chunk) = current.as_mut() {
            chunk.lines.push(line.to_string());
        }
    }

    if let Some(chunk) = current
        && !chunk.lines.is_empty()
    {
        chunks.push(chunk);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_DIFF: &str = "\
diff --git a/src/app.py b/src/app.py
index 1111111..2222222 100644
--- a/src/app.py
+++ b/src/app.py
@@ -1,3 +1,4 @@
 import os
+import sys
 print('hi')
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1 +1,2 @@
 # readme
+more
";

    #[test]
    fn well_formed_headers_yield_one_chunk_per_file() {
        let chunks = parse_chunks(STANDARD_DIFF);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(!chunk.file_path.is_empty());
            assert!(chunk.lines[0].starts_with("diff --git"));
        }
        assert_eq!(chunks[0].file_path, "src/app.py");
        assert_eq!(chunks[1].file_path, "README.md");
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(parse_chunks("").is_empty());
    }

    #[test]
    fn headerless_input_yields_empty_sequence() {
        assert!(parse_chunks("just some text\nwithout any markers\n").is_empty());
    }

    #[test]
    fn vendor_prefixed_headers_use_destination_path() {
        let diff = "\
diff --git src://old/name.py dst://new/name.py
--- src://old/name.py
+++ dst://new/name.py
@@ -1 +1 @@
-a
+b
";
        let chunks = parse_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "new/name.py");
    }

    #[test]
    fn destination_marker_overrides_provisional_name() {
        let diff = "\
diff --git src://lib/old.rs dst://lib/old.rs
--- src://lib/old.rs
+++ dst://lib/renamed.rs
@@ -1 +1 @@
-x
+y
";
        let chunks = parse_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "lib/renamed.rs");
    }

    #[test]
    fn chunk_established_only_via_destination_marker_is_captured() {
        // 헤더 라인 없이 +++ dst:// marker로만 파일이 식별되는 경우.
        let diff = "\
+++ dst://orphan/file.txt
@@ -0,0 +1 @@
+content
";
        let chunks = parse_chunks(diff);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_path, "orphan/file.txt");
        assert_eq!(chunks[0].lines.len(), 3);
    }

    #[test]
    fn duplicate_file_entries_stay_independent() {
        let diff = "\
diff --git a/same.txt b/same.txt
@@ -1 +1 @@
-a
+b
diff --git a/same.txt b/same.txt
@@ -5 +5 @@
-c
+d
";
        let chunks = parse_chunks(diff);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].file_path, chunks[1].file_path);
    }

    #[test]
    fn header_match_is_tagged() {
        assert_eq!(
            match_file_header("diff --git a/x.rs b/x.rs"),
            HeaderMatch::Matched {
                path: "x.rs".to_string()
            }
        );
        assert_eq!(
            match_file_header("diff --git src://a.rs dst://b.rs"),
            HeaderMatch::Matched {
                path: "b.rs".to_string()
            }
        );
        assert_eq!(match_file_header("diff --git weird header"), HeaderMatch::Unmatched);
        assert_eq!(match_file_header("not a header"), HeaderMatch::Unmatched);
    }

    #[test]
    fn metadata_lines_append_to_current_chunk() {
        let chunks = parse_chunks(STANDARD_DIFF);
        assert!(chunks[0].lines.iter().any(|l| l.starts_with("index ")));
        assert!(chunks[0].lines.iter().any(|l| l == " import os"));
        assert!(chunks[0].lines.iter().any(|l| l == "+import sys"));
    }
}
