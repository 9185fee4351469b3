//! Render hydrated post embeds as HTML.
//!
//! Embeds come from the appview as `app.bsky.embed.*#view` objects. They are
//! modeled as a closed tagged union; tags outside the set, and recognized tags
//! missing the fields they need, render as an empty string.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::escape::{escape_html, hostname_or_raw, is_http_url};
use crate::facet::render_rich_text;
use crate::record::{Author, PostRecord};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "$type")]
pub enum EmbedView {
    #[serde(rename = "app.bsky.embed.images#view")]
    Images { images: Option<Vec<ViewImage>> },
    #[serde(rename = "app.bsky.embed.external#view")]
    External { external: Option<ViewExternal> },
    #[serde(rename = "app.bsky.embed.record#view")]
    Record { record: Option<QuotedRecord> },
    #[serde(rename = "app.bsky.embed.video#view")]
    Video {
        thumbnail: Option<String>,
        alt: Option<String>,
    },
    #[serde(rename = "app.bsky.embed.recordWithMedia#view")]
    RecordWithMedia {
        media: Option<Box<EmbedView>>,
        record: Option<QuotedRecord>,
    },
    #[serde(other)]
    Unknown,
}

impl EmbedView {
    /// `None` when the value is not an embed we can read at all.
    pub fn from_value(value: &Value) -> Option<Self> {
        match EmbedView::deserialize(value) {
            Ok(embed) => Some(embed),
            Err(e) => {
                trace!(error = %e, "unreadable embed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewImage {
    pub thumb: Option<String>,
    pub fullsize: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewExternal {
    pub uri: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumb: Option<String>,
}

/// The `record` of a record embed.
///
/// Inside `recordWithMedia` the appview wraps the quoted record in another
/// `record#view`, so that shape unwraps to its inner record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "$type")]
pub enum QuotedRecord {
    #[serde(rename = "app.bsky.embed.record#viewRecord")]
    ViewRecord {
        author: Option<Value>,
        value: Option<Value>,
    },
    #[serde(rename = "app.bsky.embed.record#view")]
    View { record: Option<Box<QuotedRecord>> },
    /// Not found, blocked, detached, feed generators, lists, ...
    #[serde(other)]
    Unavailable,
}

/// Render an optional embed; absent embeds render as an empty string.
pub fn render_embed(embed: Option<&EmbedView>) -> String {
    let Some(embed) = embed else {
        return String::new();
    };

    match embed {
        EmbedView::Images {
            images: Some(images),
        } => render_images(images),
        EmbedView::External {
            external: Some(external),
        } => render_external(external),
        EmbedView::Record {
            record: Some(record),
        } => render_quote(record),
        EmbedView::Video {
            thumbnail: Some(thumbnail),
            alt,
        } => render_video(thumbnail, alt.as_deref()),
        EmbedView::RecordWithMedia { media, record } => {
            let mut html = render_embed(media.as_deref());
            if let Some(record) = record {
                html.push_str(&render_quote(record));
            }
            html
        }
        EmbedView::Images { images: None }
        | EmbedView::External { external: None }
        | EmbedView::Record { record: None }
        | EmbedView::Video {
            thumbnail: None, ..
        }
        | EmbedView::Unknown => String::new(),
    }
}

/// Parse and render an untyped embed value.
pub fn render_embed_value(value: Option<&Value>) -> String {
    let embed = value.and_then(EmbedView::from_value);
    render_embed(embed.as_ref())
}

fn render_images(images: &[ViewImage]) -> String {
    let mut html = String::from("<div class=\"images\">");
    for img in images {
        let Some(src) = img.fullsize.as_deref().or(img.thumb.as_deref()) else {
            continue;
        };
        html.push_str("<img src=\"");
        html.push_str(&escape_html(src));
        html.push_str("\" alt=\"");
        html.push_str(&escape_html(img.alt.as_deref().unwrap_or_default()));
        html.push_str("\" loading=\"lazy\">");
    }
    html.push_str("</div>");
    html
}

fn render_external(external: &ViewExternal) -> String {
    let Some(uri) = external.uri.as_deref().filter(|u| is_http_url(u)) else {
        return String::new();
    };

    let mut html = String::new();
    html.push_str("<a class=\"card\" href=\"");
    html.push_str(&escape_html(uri));
    html.push_str("\" target=\"_blank\" rel=\"noopener\">");

    if let Some(thumb) = &external.thumb {
        html.push_str("<img src=\"");
        html.push_str(&escape_html(thumb));
        html.push_str("\" alt=\"\" loading=\"lazy\">");
    }

    html.push_str("<span class=\"card-title\">");
    html.push_str(&escape_html(external.title.as_deref().unwrap_or_default()));
    html.push_str("</span>");
    html.push_str("<span class=\"card-desc\">");
    html.push_str(&escape_html(
        external.description.as_deref().unwrap_or_default(),
    ));
    html.push_str("</span>");
    html.push_str("<span class=\"card-url\">");
    html.push_str(&escape_html(&hostname_or_raw(uri)));
    html.push_str("</span>");

    html.push_str("</a>");
    html
}

fn render_quote(record: &QuotedRecord) -> String {
    match record {
        QuotedRecord::ViewRecord {
            author: Some(author),
            value: Some(value),
        } => {
            let Some(author) = Author::from_value(author) else {
                return String::new();
            };
            let post = PostRecord::from_value(value);

            let mut html = String::from("<blockquote class=\"quote\">");
            html.push_str("<a href=\"/");
            html.push_str(&escape_html(&author.handle));
            html.push_str("\" class=\"quote-author\">");
            html.push_str(&escape_html(author.name()));
            html.push_str("</a>");
            html.push_str("<p>");
            html.push_str(&render_rich_text(&post.text, &post.facets));
            html.push_str("</p></blockquote>");
            html
        }
        QuotedRecord::View {
            record: Some(inner),
        } => render_quote(inner),
        _ => String::new(),
    }
}

fn render_video(thumbnail: &str, alt: Option<&str>) -> String {
    let alt = alt.filter(|a| !a.is_empty()).unwrap_or("Video");
    let mut html = String::from("<div class=\"video\"><img src=\"");
    html.push_str(&escape_html(thumbnail));
    html.push_str("\" alt=\"");
    html.push_str(&escape_html(alt));
    html.push_str("\" loading=\"lazy\"><span class=\"video-badge\">Video</span></div>");
    html
}
