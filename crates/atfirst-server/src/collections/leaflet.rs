//! `pub.leaflet.document`: documents made of pages of blocks.

use std::collections::HashMap;

use atfirst_renderer::record::str_field;
use atfirst_renderer::{ItemView, RawRecord, escape_html, truncate_text};
use serde_json::Value;
use tracing::debug;

use super::FeedContext;

const BODY_LIMIT: usize = 200;

/// Plaintext of every block on every page, one paragraph per block.
fn extract_text(pages: Option<&Value>) -> String {
    let Some(pages) = pages.and_then(Value::as_array) else {
        return String::new();
    };
    pages
        .iter()
        .filter_map(|page| page.get("blocks").and_then(Value::as_array))
        .flatten()
        .filter_map(|b| b.pointer("/block/plaintext").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split `at://<repo>/<collection>/<rkey>`.
fn split_at_uri(uri: &str) -> Option<(&str, &str, &str)> {
    let mut parts = uri.strip_prefix("at://")?.splitn(3, '/');
    Some((parts.next()?, parts.next()?, parts.next()?))
}

/// Look up each referenced publication's `base_path`. Lookups that fail are
/// left out.
async fn fetch_base_paths(cx: FeedContext<'_>, records: &[RawRecord]) -> HashMap<String, String> {
    let mut base_paths = HashMap::new();
    for publication in records.iter().filter_map(|r| r.str_field("publication")) {
        if base_paths.contains_key(publication) {
            continue;
        }
        let Some((repo, collection, rkey)) = split_at_uri(publication) else {
            debug!(%publication, "publication is not an at:// uri");
            continue;
        };
        let value = cx
            .client
            .get_record(&cx.identity.pds, repo, collection, rkey)
            .await;
        if let Some(base_path) = value
            .as_ref()
            .and_then(|v| str_field(v, "base_path"))
            .filter(|p| !p.is_empty())
        {
            base_paths.insert(publication.to_string(), base_path.to_string());
        }
    }
    base_paths
}

pub async fn view_all(cx: FeedContext<'_>, records: &[RawRecord]) -> Vec<ItemView> {
    let base_paths = fetch_base_paths(cx, records).await;
    records
        .iter()
        .map(|r| document_view(r, &base_paths))
        .collect()
}

fn document_view(record: &RawRecord, base_paths: &HashMap<String, String>) -> ItemView {
    let text = extract_text(record.value.get("pages"));
    let href = record
        .str_field("publication")
        .and_then(|p| base_paths.get(p))
        .map(|base| format!("https://{base}/{}", record.rkey()));

    ItemView {
        date: record.str_field("publishedAt").map(str::to_string),
        date_href: href,
        title: record.str_field("title").map(str::to_string),
        body: (!text.is_empty()).then(|| escape_html(&truncate_text(&text, BODY_LIMIT))),
        ..Default::default()
    }
}
