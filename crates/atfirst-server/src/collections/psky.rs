//! `social.psky.feed.post`: short plain-text posts.

use atfirst_renderer::{ItemView, RawRecord, escape_html};

pub fn view_all(records: &[RawRecord]) -> Vec<ItemView> {
    records
        .iter()
        .map(|r| ItemView {
            body: Some(escape_html(r.str_field("text").unwrap_or_default())),
            ..Default::default()
        })
        .collect()
}
