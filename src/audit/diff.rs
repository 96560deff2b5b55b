//! Diff summaries for audit entries

use serde_json::Value;

/// Fields that change on every write and would drown the real changes
const NOISE_FIELDS: &[&str] = &["updated_at", "version"];

/// Summarize the top-level field changes between two snapshots
///
/// Returns `None` when nothing meaningful changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut changes = Vec::new();

            for (key, before_val) in before_obj {
                if NOISE_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(before_val),
                        format_value(after_val)
                    )),
                    Some(_) => {}
                    None => changes.push(format!("{}: {} -> (removed)", key, format_value(before_val))),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) && !NOISE_FIELDS.contains(&key.as_str()) {
                    changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
                }
            }

            if changes.is_empty() {
                None
            } else {
                Some(changes.join(", "))
            }
        }
        _ if before != after => Some(format!(
            "{} -> {}",
            format_value(before),
            format_value(after)
        )),
        _ => None,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            let truncated: String = s.chars().take(47).collect();
            format!("\"{}...\"", truncated)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_change() {
        let before = json!({"status": "draft", "version": 1, "updated_at": "a"});
        let after = json!({"status": "approved", "version": 2, "updated_at": "b"});

        assert_eq!(
            generate_diff(&before, &after),
            Some("status: \"draft\" -> \"approved\"".to_string())
        );
    }

    #[test]
    fn test_only_noise_changed() {
        let before = json!({"name": "Tithe", "version": 1});
        let after = json!({"name": "Tithe", "version": 2});
        assert_eq!(generate_diff(&before, &after), None);
    }

    #[test]
    fn test_added_removed_and_nested() {
        let before = json!({"external_link": "https://x", "actions": [1, 2]});
        let after = json!({"actions": [1, 2, 3], "approved_at": null});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("external_link: \"https://x\" -> (removed)"));
        assert!(diff.contains("actions: [2 items] -> [3 items]"));
        assert!(diff.contains("approved_at: (added) -> null"));
    }

    #[test]
    fn test_long_strings_truncated() {
        let long = "é".repeat(60);
        let diff = generate_diff(&json!(long), &json!("short")).unwrap();
        assert!(diff.starts_with(&format!("\"{}...\"", "é".repeat(47))));
    }
}
