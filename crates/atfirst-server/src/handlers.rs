use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{Feed, FeedKey};
use crate::client::Identity;
use crate::collections::{DEFAULT_COLLECTION, FeedContext, load_feed, picker_options};
use crate::error::FeedError;
use crate::page::{FeedSection, Page, render_page};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    actor: Option<String>,
    collection: Option<String>,
}

fn html(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=UTF-8")], body).into_response()
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn clean_actor(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed)
}

/// Canonical path for a feed, with each segment percent-encoded. The default
/// collection is left implicit.
fn feed_path(actor: &str, collection: &str) -> String {
    let collection = (collection != DEFAULT_COLLECTION).then_some(collection);
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return format!("/{actor}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(actor);
        if let Some(collection) = collection {
            segments.push(collection);
        }
    }
    url.path().to_string()
}

/// `GET /`: the bare form, or a redirect when the form was submitted.
pub async fn index(Query(query): Query<LookupQuery>) -> Response {
    let actor = query.actor.as_deref().map(clean_actor).unwrap_or_default();
    if !actor.is_empty() {
        let collection = query
            .collection
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COLLECTION);
        return found(feed_path(actor, collection));
    }

    let options = picker_options(&[], DEFAULT_COLLECTION);
    html(render_page(&Page {
        actor: None,
        collection: DEFAULT_COLLECTION,
        options: &options,
        feed: FeedSection::Empty,
    }))
}

/// `GET /{actor}`
pub async fn actor_feed(State(state): State<AppState>, Path(actor): Path<String>) -> Response {
    feed_page(&state, &actor, DEFAULT_COLLECTION).await
}

/// `GET /{actor}/{collection}`
pub async fn collection_feed(
    State(state): State<AppState>,
    Path((actor, collection)): Path<(String, String)>,
) -> Response {
    feed_page(&state, &actor, &collection).await
}

async fn feed_page(state: &AppState, raw_actor: &str, collection: &str) -> Response {
    let actor = clean_actor(raw_actor);
    if actor != raw_actor {
        return found(feed_path(actor, collection));
    }

    let identity = match state.client.resolve_identity(actor).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(%actor, error = %e, "identity resolution failed");
            let options = picker_options(&[], collection);
            let message = e.to_string();
            return html(render_page(&Page {
                actor: Some(actor),
                collection,
                options: &options,
                feed: FeedSection::Error(&message),
            }));
        }
    };

    let (repo_collections, feed) = tokio::join!(
        state.client.describe_repo(&identity),
        cached_feed(state, &identity, actor, collection),
    );
    let options = picker_options(&repo_collections, collection);

    let message;
    let feed = match &feed {
        Ok(items) => FeedSection::Items(items),
        Err(e) => {
            warn!(did = %identity.did, %collection, error = %e, "feed load failed");
            message = e.to_string();
            FeedSection::Error(&message)
        }
    };

    html(render_page(&Page {
        actor: Some(actor),
        collection,
        options: &options,
        feed,
    }))
}

/// Serve from the cache when possible; fresh feeds are stored without
/// blocking the response.
async fn cached_feed(
    state: &AppState,
    identity: &Identity,
    actor: &str,
    collection: &str,
) -> Result<Feed, FeedError> {
    let key = FeedKey::new(&identity.did, collection);
    if let Some(feed) = state.cache.get(&key) {
        debug!(did = %identity.did, %collection, "feed cache hit");
        return Ok(feed);
    }

    let cx = FeedContext {
        client: &state.client,
        identity,
        actor,
        limit: state.record_limit,
    };
    let feed: Feed = load_feed(cx, collection).await?.into();

    let cache = state.cache.clone();
    let stored = feed.clone();
    tokio::spawn(async move {
        cache.insert(key, stored);
    });
    Ok(feed)
}
