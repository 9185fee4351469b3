//! `fyi.unravel.frontpage.post`: shared links.

use atfirst_renderer::{ItemView, RawRecord, hostname_or_raw, is_http_url};

pub fn view_all(records: &[RawRecord], actor: &str) -> Vec<ItemView> {
    records
        .iter()
        .map(|record| {
            let url = record.str_field("url");
            ItemView {
                date: record.str_field("createdAt").map(str::to_string),
                date_href: Some(format!(
                    "https://frontpage.fyi/post/{actor}/{}",
                    record.rkey()
                )),
                title: record.str_field("title").map(str::to_string),
                title_href: url.filter(|u| is_http_url(u)).map(str::to_string),
                meta: url.map(hostname_or_raw),
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_view() {
        let records = [RawRecord {
            uri: "at://did:plc:a/fyi.unravel.frontpage.post/3kfp".into(),
            value: json!({
                "title": "Interesting <article>",
                "url": "https://news.example.org/a/b",
                "createdAt": "2024-06-01T00:00:00Z"
            }),
        }];
        let view = &view_all(&records, "alice.test")[0];
        assert_eq!(view.title.as_deref(), Some("Interesting <article>"));
        assert_eq!(view.title_href.as_deref(), Some("https://news.example.org/a/b"));
        assert_eq!(view.meta.as_deref(), Some("news.example.org"));
        assert_eq!(
            view.date_href.as_deref(),
            Some("https://frontpage.fyi/post/alice.test/3kfp")
        );
    }

    #[test]
    fn test_unparseable_url_is_shown_raw_but_not_linked() {
        let records = [RawRecord {
            uri: "at://did:plc:a/fyi.unravel.frontpage.post/x".into(),
            value: json!({"title": "t", "url": "javascript:alert(1)"}),
        }];
        let view = &view_all(&records, "a")[0];
        assert_eq!(view.title_href, None);
        assert_eq!(view.meta.as_deref(), Some("javascript:alert(1)"));
    }
}
