//! Fallback view for record types without a dedicated builder.

use serde_json::Value;

use crate::escape::escape_html;
use crate::record::str_field;
use crate::truncate::truncate_text;
use crate::view::ItemView;

const BODY_LIMIT: usize = 200;
/// Non-primary fields longer than this are shown as well.
const SECONDARY_MIN: usize = 100;

/// Best guess at the interesting text of an arbitrary record.
///
/// The longest non-empty string field becomes the body, followed by any other
/// string field longer than [`SECONDARY_MIN`] characters, in record order.
pub fn generic_view(value: &Value) -> ItemView {
    let date = str_field(value, "createdAt").map(str::to_string);

    let fields: Vec<(&str, &str, usize)> = value
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(key, _)| !matches!(key.as_str(), "$type" | "createdAt"))
        .filter_map(|(key, v)| {
            let s = v.as_str().filter(|s| !s.is_empty())?;
            Some((key.as_str(), s, s.chars().count()))
        })
        .collect();

    // First field wins ties.
    let Some(longest) = fields
        .iter()
        .reduce(|a, b| if b.2 > a.2 { b } else { a })
        .map(|(key, _, _)| *key)
    else {
        return ItemView {
            date,
            ..Default::default()
        };
    };

    let body: String = fields
        .iter()
        .filter(|(key, _, len)| *key == longest || *len > SECONDARY_MIN)
        .map(|(_, s, _)| escape_html(&truncate_text(s, BODY_LIMIT)))
        .collect();

    ItemView {
        date,
        body: Some(body),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_long_field_only() {
        let long = "a very long string ".repeat(6);
        let view = generic_view(&json!({
            "createdAt": "2024-01-01",
            "title": "x",
            "body": long,
        }));
        assert_eq!(view.date.as_deref(), Some("2024-01-01"));
        assert_eq!(view.body, Some(escape_html(&truncate_text(&long, 200))));
    }

    #[test]
    fn test_secondary_fields_follow_record_order() {
        let first = format!("first {}", "1".repeat(120));
        let second = format!("second {}", "2".repeat(150));
        let view = generic_view(&json!({
            "$type": "com.example.thing",
            "summary": first,
            "short": "tiny",
            "content": second,
        }));
        assert_eq!(view.body, Some(format!("{first}{second}")));
        assert_eq!(view.date, None);
    }

    #[test]
    fn test_tie_picks_first_field() {
        let view = generic_view(&json!({"a": "one", "b": "two"}));
        assert_eq!(view.body.as_deref(), Some("one"));
    }

    #[test]
    fn test_body_is_escaped() {
        let view = generic_view(&json!({"text": "<b>hi</b>"}));
        assert_eq!(view.body.as_deref(), Some("&lt;b&gt;hi&lt;/b&gt;"));
    }

    #[test]
    fn test_no_string_fields() {
        let view = generic_view(&json!({
            "createdAt": "2024-01-01T00:00:00Z",
            "$type": "com.example.counter",
            "count": 3,
            "empty": "",
            "nested": {"text": "ignored"}
        }));
        assert_eq!(view.date.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(view.body, None);
    }

    #[test]
    fn test_non_object_and_bad_date() {
        assert_eq!(generic_view(&json!("just a string")), ItemView::default());
        assert_eq!(generic_view(&json!(null)), ItemView::default());
        let view = generic_view(&json!({"createdAt": 12345}));
        assert_eq!(view.date, None);
    }
}
