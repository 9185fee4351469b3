//! `app.bsky.feed.post`: oldest posts, hydrated through the appview.

use std::collections::{HashMap, HashSet};

use atfirst_renderer::record::{str_field, u64_field};
use atfirst_renderer::{
    Author, ItemAuthor, ItemStats, ItemView, PostRecord, RawRecord, ReplyContext, render_embed_value,
    render_rich_text, rkey,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{Collection, FeedContext};
use crate::error::FeedError;

/// Bluesky-hosted PDSes list newest-first by default, so `reverse` is enough.
fn is_bsky_hosted(pds: &str) -> bool {
    Url::parse(pds)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.ends_with(".host.bsky.network")))
        .unwrap_or(false)
}

pub async fn fetch_records(cx: FeedContext<'_>) -> Result<Vec<RawRecord>, FeedError> {
    let id = Collection::BskyPost.id();
    if is_bsky_hosted(&cx.identity.pds) {
        return cx.client.list_records(cx.identity, id, cx.limit, true).await;
    }

    let (forward, reverse) = tokio::join!(
        cx.client.list_records(cx.identity, id, cx.limit, false),
        cx.client.list_records(cx.identity, id, cx.limit, true),
    );
    merge_listings(forward, reverse, cx.limit as usize)
}

/// Merge two listings of unknown order into the oldest `limit` records.
///
/// One failed listing is tolerated; if both fail, the first error wins.
pub fn merge_listings(
    forward: Result<Vec<RawRecord>, FeedError>,
    reverse: Result<Vec<RawRecord>, FeedError>,
    limit: usize,
) -> Result<Vec<RawRecord>, FeedError> {
    let (forward, reverse) = match (forward, reverse) {
        (Err(e), Err(_)) => return Err(e),
        (Ok(f), Err(e)) => {
            debug!(error = %e, "reverse listing failed, using forward only");
            (f, Vec::new())
        }
        (Err(e), Ok(r)) => {
            debug!(error = %e, "forward listing failed, using reverse only");
            (Vec::new(), r)
        }
        (Ok(f), Ok(r)) => (f, r),
    };

    let mut seen = HashSet::new();
    let mut merged: Vec<RawRecord> = forward
        .into_iter()
        .chain(reverse)
        .filter(|r| seen.insert(r.uri.clone()))
        .collect();
    merged.sort_by(|a, b| a.uri.cmp(&b.uri));
    merged.truncate(limit);
    Ok(merged)
}

/// Reply parents that are not part of the batch itself, deduplicated.
fn parent_uris(records: &[RawRecord]) -> Vec<String> {
    let own: HashSet<&str> = records.iter().map(|r| r.uri.as_str()).collect();
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.value.pointer("/reply/parent/uri").and_then(Value::as_str))
        .filter(|uri| !own.contains(uri) && seen.insert(*uri))
        .map(str::to_string)
        .collect()
}

pub async fn view_all(cx: FeedContext<'_>, records: &[RawRecord]) -> Result<Vec<ItemView>, FeedError> {
    let uris: Vec<String> = records.iter().map(|r| r.uri.clone()).collect();
    let parents = parent_uris(records);

    let (posts, parent_posts) = tokio::join!(cx.client.get_posts(&uris), async {
        if parents.is_empty() {
            Ok(Vec::new())
        } else {
            cx.client.get_posts(&parents).await
        }
    });
    let posts = posts?;
    let parent_posts = parent_posts.unwrap_or_else(|e| {
        debug!(error = %e, "parent hydration failed, dropping reply context");
        Vec::new()
    });

    Ok(build_views(&uris, &posts, &parent_posts))
}

/// Assemble views in listing order. Posts the appview did not return are
/// skipped.
pub fn build_views(uris: &[String], posts: &[Value], parent_posts: &[Value]) -> Vec<ItemView> {
    let by_uri = |list: &[Value]| -> HashMap<String, usize> {
        list.iter()
            .enumerate()
            .filter_map(|(i, p)| str_field(p, "uri").map(|u| (u.to_string(), i)))
            .collect()
    };
    let post_index = by_uri(posts);
    let parent_index = by_uri(parent_posts);

    uris.iter()
        .filter_map(|uri| {
            let post = &posts[*post_index.get(uri)?];
            let parent = post
                .pointer("/record/reply/parent/uri")
                .and_then(Value::as_str)
                .and_then(|parent_uri| {
                    post_index
                        .get(parent_uri)
                        .map(|&i| &posts[i])
                        .or_else(|| parent_index.get(parent_uri).map(|&i| &parent_posts[i]))
                });
            post_to_view(post, parent)
        })
        .collect()
}

/// Build the view of one hydrated post. `None` when the post has no author.
pub fn post_to_view(post: &Value, parent: Option<&Value>) -> Option<ItemView> {
    let Some(author) = post.get("author").and_then(Author::from_value) else {
        debug!(uri = ?str_field(post, "uri"), "post without author");
        return None;
    };
    let record = post.get("record").map(PostRecord::from_value).unwrap_or_default();
    let uri = str_field(post, "uri").unwrap_or_default();

    let embed = render_embed_value(post.get("embed"));
    let count = |key| u64_field(post, key).unwrap_or(0);

    Some(ItemView {
        date: record.created_at.clone(),
        date_href: Some(format!(
            "https://bsky.app/profile/{}/post/{}",
            author.handle,
            rkey(uri)
        )),
        body: Some(render_rich_text(&record.text, &record.facets)),
        embed: (!embed.is_empty()).then_some(embed),
        stats: Some(ItemStats {
            replies: count("replyCount"),
            reposts: count("repostCount"),
            likes: count("likeCount"),
        }),
        reply_context: parent.and_then(reply_context),
        author: Some(ItemAuthor {
            name: author.name().to_string(),
            handle: author.handle,
            avatar: author.avatar,
        }),
        ..Default::default()
    })
}

fn reply_context(parent: &Value) -> Option<ReplyContext> {
    let author = parent.get("author").and_then(Author::from_value)?;
    let text = parent
        .pointer("/record/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(ReplyContext {
        name: author.name().to_string(),
        href: format!("/{}", author.handle),
        text: text.to_string(),
    })
}
