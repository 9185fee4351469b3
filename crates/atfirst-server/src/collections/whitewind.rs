//! `com.whtwnd.blog.entry`: markdown blog entries.

use atfirst_renderer::{ItemView, RawRecord, truncate_markdown};

const BODY_LIMIT: usize = 200;

pub fn view_all(records: &[RawRecord], actor: &str) -> Vec<ItemView> {
    records.iter().map(|r| entry_view(r, actor)).collect()
}

fn entry_view(record: &RawRecord, actor: &str) -> ItemView {
    ItemView {
        date: record.str_field("createdAt").map(str::to_string),
        date_href: Some(format!("https://whtwnd.com/{actor}/{}", record.rkey())),
        title: record.str_field("title").map(str::to_string),
        body: record
            .str_field("content")
            .filter(|c| !c.is_empty())
            .map(|c| truncate_markdown(c, BODY_LIMIT)),
        ..Default::default()
    }
}
