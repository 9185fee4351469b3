//! Static registry of the collections with dedicated views.
//!
//! Each known collection decides how its records are fetched and how they
//! become [`ItemView`]s. Any other collection is listed oldest-first and shown
//! through [`generic_view`].

use atfirst_renderer::{ItemView, RawRecord, generic_view};
use tracing::debug;

use crate::client::{AtClient, Identity};
use crate::error::FeedError;

pub mod bsky_post;
pub mod frontpage;
pub mod leaflet;
pub mod psky;
pub mod whitewind;

/// Shown when no collection is requested.
pub const DEFAULT_COLLECTION: &str = "app.bsky.feed.post";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    BskyPost,
    WhitewindEntry,
    LeafletDocument,
    FrontpagePost,
    PskyPost,
}

/// How records are pulled from the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One listing page, optionally reversed.
    Listing { reverse: bool },
    /// Forward and reverse listings merged, for PDSes of unknown ordering.
    Merged,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::BskyPost,
        Collection::WhitewindEntry,
        Collection::LeafletDocument,
        Collection::FrontpagePost,
        Collection::PskyPost,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            Collection::BskyPost => "app.bsky.feed.post",
            Collection::WhitewindEntry => "com.whtwnd.blog.entry",
            Collection::LeafletDocument => "pub.leaflet.document",
            Collection::FrontpagePost => "fyi.unravel.frontpage.post",
            Collection::PskyPost => "social.psky.feed.post",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Collection::BskyPost => "Bluesky Posts",
            Collection::WhitewindEntry => "Whitewind Blogs",
            Collection::LeafletDocument => "Leaflet Documents",
            Collection::FrontpagePost => "Frontpage Links",
            Collection::PskyPost => "Picosky Posts",
        }
    }

    pub fn fetch_strategy(self) -> FetchStrategy {
        match self {
            Collection::BskyPost => FetchStrategy::Merged,
            Collection::LeafletDocument | Collection::FrontpagePost => {
                FetchStrategy::Listing { reverse: true }
            }
            Collection::WhitewindEntry | Collection::PskyPost => {
                FetchStrategy::Listing { reverse: false }
            }
        }
    }
}

/// Everything a view builder may need beyond the records themselves.
#[derive(Debug, Clone, Copy)]
pub struct FeedContext<'a> {
    pub client: &'a AtClient,
    pub identity: &'a Identity,
    /// The actor as the visitor typed it (handle or DID).
    pub actor: &'a str,
    pub limit: u32,
}

async fn fetch_records(
    cx: FeedContext<'_>,
    collection: &str,
    strategy: FetchStrategy,
) -> Result<Vec<RawRecord>, FeedError> {
    match strategy {
        FetchStrategy::Listing { reverse } => {
            cx.client
                .list_records(cx.identity, collection, cx.limit, reverse)
                .await
        }
        FetchStrategy::Merged => bsky_post::fetch_records(cx).await,
    }
}

/// Fetch and build the views of one collection.
pub async fn load_feed(cx: FeedContext<'_>, collection: &str) -> Result<Vec<ItemView>, FeedError> {
    let known = Collection::from_id(collection);
    let strategy = known.map_or(FetchStrategy::Listing { reverse: true }, Collection::fetch_strategy);

    let records = fetch_records(cx, collection, strategy).await?;
    debug!(%collection, count = records.len(), "fetched records");
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let views = match known {
        Some(Collection::BskyPost) => bsky_post::view_all(cx, &records).await?,
        Some(Collection::WhitewindEntry) => whitewind::view_all(&records, cx.actor),
        Some(Collection::LeafletDocument) => leaflet::view_all(cx, &records).await,
        Some(Collection::FrontpagePost) => frontpage::view_all(&records, cx.actor),
        Some(Collection::PskyPost) => psky::view_all(&records),
        None => records.iter().map(|r| generic_view(&r.value)).collect(),
    };
    Ok(views)
}

/// Options for the collection picker: the registry first, then any other
/// collection the repository reports, then the current one if still missing.
pub fn picker_options(repo_collections: &[String], current: &str) -> Vec<(String, String)> {
    let mut options: Vec<(String, String)> = Collection::ALL
        .iter()
        .map(|c| (c.id().to_string(), c.label().to_string()))
        .collect();

    for id in repo_collections.iter().map(String::as_str).chain([current]) {
        if !id.is_empty() && !options.iter().any(|(known, _)| known == id) {
            options.push((id.to_string(), id.to_string()));
        }
    }
    options
}
