//! 도메인 정책(코멘트 템플릿, 리뷰 파일 해석, PR 기본 문구).

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::pr::{CommentDraft, to_posix_path};

/// 코멘트 본문 템플릿 스타일.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Default,
    Concise,
    Professional,
}

impl CommentStyle {
    /// 설정 문자열을 스타일로 변환한다. 미지정/알 수 없는 값은 default.
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("concise") => Self::Concise,
            Some("professional") => Self::Professional,
            _ => Self::Default,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Concise => "concise",
            Self::Professional => "professional",
        }
    }
}

/// 라인에 고정되는 inline 코멘트 본문을 만든다.
pub fn render_inline(style: CommentStyle, file: &str, line: u32, feedback: &str) -> String {
    match style {
        CommentStyle::Default => {
            format!("🤖 **Review note @ line ~{line} in `{file}`**\n\n{feedback}")
        }
        CommentStyle::Concise => format!("💡 **Suggestion @ line {line}**\n\n{feedback}"),
        CommentStyle::Professional => format!("**AI Review Note (line {line})**\n\n{feedback}"),
    }
}

/// 파일/PR 전체 대상 일반 코멘트 본문을 만든다.
pub fn render_general(style: CommentStyle, subject: &str, feedback: &str) -> String {
    match style {
        CommentStyle::Default => format!("🤖 **Review for `{subject}`**\n\n{feedback}"),
        CommentStyle::Concise => format!("📝 **Review notes for {subject}**\n\n{feedback}"),
        CommentStyle::Professional => format!("**AI Code Review: {subject}**\n\n{feedback}"),
    }
}

pub fn default_pr_title(source: &str, target: &str) -> String {
    format!("Auto PR: {source} → {target}")
}

pub const DEFAULT_PR_DESCRIPTION: &str = "Created by bbpilot.";

/// 리뷰 파일에서 읽은 한 건의 피드백.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub file: String,
    pub line: Option<u32>,
    pub feedback: String,
}

/// 리뷰 텍스트를 엔트리 목록으로 해석한다. 지원 형식:
///  - `src/app.py:25 Some suggestion`
///  - `src/app.py line 25: Some suggestion`
///  - `file: src/app.py line: 25` 다음에 본문 블록
///  - `src/app.py (general): Overall feedback`
pub fn parse_review_entries(text: &str) -> Vec<ReviewEntry> {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    static HEADER: OnceLock<Regex> = OnceLock::new();

    let inline = INLINE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(.+?)\s*(?::\s*(\d+)|[\s-]\s*line\s*(\d+)|\s*\(general\))?\s*[:\-]\s*(.+)\s*$",
        )
        .unwrap()
    });
    let header = HEADER
        .get_or_init(|| Regex::new(r"(?i)^\s*file\s*:\s*(.+?)\s*(?:line\s*:\s*(\d+))?\s*$").unwrap());

    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = header.captures(line) {
            let file = caps[1].trim().to_string();
            let anchor = caps.get(2).and_then(|m| m.as_str().parse().ok());
            i += 1;
            let mut buf = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() {
                buf.push(lines[i]);
                i += 1;
            }
            let feedback = buf.join("\n").trim().to_string();
            if !file.is_empty() && !feedback.is_empty() {
                out.push(ReviewEntry {
                    file: to_posix_path(&file),
                    line: anchor,
                    feedback,
                });
            }
            while i < lines.len() && lines[i].trim().is_empty() {
                i += 1;
            }
            continue;
        }

        if let Some(caps) = inline.captures(line) {
            let file = to_posix_path(caps[1].trim());
            let anchor = caps
                .get(2)
                .or_else(|| caps.get(3))
                .and_then(|m| m.as_str().parse().ok());
            let general = line.to_ascii_lowercase().contains("(general)");
            let feedback = caps[4].trim().to_string();
            if !file.is_empty() && !feedback.is_empty() {
                out.push(ReviewEntry {
                    file,
                    line: if general { None } else { anchor },
                    feedback,
                });
            }
        }

        i += 1;
    }

    out
}

/// 엔트리를 템플릿이 적용된 게시용 초안으로 바꾼다.
pub fn entries_to_drafts(entries: &[ReviewEntry], style: CommentStyle) -> Vec<CommentDraft> {
    entries
        .iter()
        .map(|entry| match entry.line {
            Some(line) => CommentDraft::inline(
                entry.file.clone(),
                line,
                render_inline(style, &entry.file, line, &entry.feedback),
            ),
            None => CommentDraft {
                target_path: None,
                anchor_line: None,
                body: render_general(style, &entry.file, &entry.feedback),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_line_form() {
        let entries = parse_review_entries("src/app.py:25 - use a context manager");
        assert_eq!(
            entries,
            vec![ReviewEntry {
                file: "src/app.py".to_string(),
                line: Some(25),
                feedback: "use a context manager".to_string(),
            }]
        );
    }

    #[test]
    fn parses_header_block_form() {
        let text = "file: src/app.py line: 12\nfirst line\nsecond line\n\nignored";
        let entries = parse_review_entries(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, "src/app.py");
        assert_eq!(entries[0].line, Some(12));
        assert_eq!(entries[0].feedback, "first line\nsecond line");
    }

    #[test]
    fn general_marker_drops_anchor_line() {
        let entries = parse_review_entries("src/app.py (general): overall looks fine");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line, None);
        assert_eq!(entries[0].feedback, "overall looks fine");
    }

    #[test]
    fn backslash_paths_are_normalized() {
        let entries = parse_review_entries("src\\win\\mod.rs:3 - check this");
        assert_eq!(entries[0].file, "src/win/mod.rs");
    }

    #[test]
    fn anchored_entry_becomes_inline_draft() {
        let entries = vec![ReviewEntry {
            file: "a.rs".to_string(),
            line: Some(4),
            feedback: "note".to_string(),
        }];
        let drafts = entries_to_drafts(&entries, CommentStyle::Concise);
        assert_eq!(drafts[0].target_path.as_deref(), Some("a.rs"));
        assert_eq!(drafts[0].anchor_line, Some(4));
        assert!(drafts[0].body.contains("Suggestion @ line 4"));
    }

    #[test]
    fn style_falls_back_to_default() {
        assert_eq!(CommentStyle::from_config(None), CommentStyle::Default);
        assert_eq!(CommentStyle::from_config(Some("unknown")), CommentStyle::Default);
        assert_eq!(
            CommentStyle::from_config(Some(" Professional ")),
            CommentStyle::Professional
        );
    }
}
