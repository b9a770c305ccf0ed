//! ADF(Atlassian Document Format) 트리에서 순수 텍스트를 뽑는 모듈.

use serde_json::Value;

/// 노드 트리를 깊이 우선으로 걸으며 `text` 값을 모은다.
/// `paragraph`/`listItem` 노드 뒤에는 줄바꿈을 붙인다.
pub fn extract_text(node: &Value) -> String {
    let mut out = String::new();
    walk(node, &mut out);
    out.trim_end().to_string()
}

fn walk(node: &Value, out: &mut String) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(Value::Array(children)) = map.get("content") {
                for child in children {
                    walk(child, out);
                }
            }
            if matches!(
                map.get("type").and_then(Value::as_str),
                Some("paragraph") | Some("listItem")
            ) {
                out.push('\n');
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paragraphs_become_lines() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "first"}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "second"}]}
            ]
        });
        assert_eq!(extract_text(&doc), "first\nsecond");
    }

    #[test]
    fn list_items_each_get_a_newline() {
        let doc = json!({
            "type": "doc",
            "content": [{
                "type": "bulletList",
                "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "a"}]}
                    ]},
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "b"}]}
                    ]}
                ]
            }]
        });
        assert_eq!(extract_text(&doc), "a\n\nb");
    }

    #[test]
    fn inline_marks_do_not_break_text_order() {
        let doc = json!({
            "type": "paragraph",
            "content": [
                {"type": "text", "text": "use "},
                {"type": "text", "text": "Result", "marks": [{"type": "code"}]},
                {"type": "text", "text": " here"}
            ]
        });
        assert_eq!(extract_text(&doc), "use Result here");
    }

    #[test]
    fn non_object_input_is_empty() {
        assert_eq!(extract_text(&json!(42)), "");
        assert_eq!(extract_text(&json!(null)), "");
    }
}
