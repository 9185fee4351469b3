//! at first renderer
//!
//! Turns AT Protocol records into HTML fragments. Every function here is pure
//! and total: upstream data is untrusted, so malformed fields degrade the
//! output instead of failing it.
//!
//! The pipeline is record → [`ItemView`] → [`render_item`]. Post records go
//! through the facet-aware [`render_rich_text`] and the [`render_embed`]
//! dispatcher; unknown record types fall back to [`generic_view`].

pub mod embed;
pub mod escape;
pub mod facet;
pub mod generic;
pub mod record;
pub mod truncate;
pub mod view;

pub use embed::{EmbedView, render_embed, render_embed_value};
pub use escape::{escape_html, hostname_or_raw, is_http_url, rkey};
pub use facet::{ByteRange, Facet, FacetFeature, render_rich_text};
pub use generic::generic_view;
pub use record::{Author, PostRecord, RawRecord};
pub use truncate::{truncate_markdown, truncate_text};
pub use view::{ItemAuthor, ItemStats, ItemView, ReplyContext, render_item};
