//! Facet-aware rich text.
//!
//! Facets address the UTF-8 byte stream of a text, not its characters. The
//! segmenter slices the byte buffer into ordered spans and the renderer decodes
//! and escapes each span independently, so multi-byte characters never shift
//! an annotation.

use std::borrow::Cow;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::escape::{escape_html, is_http_url};

/// Half-open byte range of a facet.
///
/// Stored signed so that negative offsets from a misbehaving client still
/// deserialize and get rejected by [`ByteRange::resolve`] instead of dropping
/// the whole facet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteRange {
    pub byte_start: i64,
    pub byte_end: i64,
}

impl ByteRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            byte_start: start,
            byte_end: end,
        }
    }

    /// The usable range given the segmenter cursor and the text length.
    ///
    /// `None` when the range starts before the cursor (overlap), ends past the
    /// text, or is inverted. An empty range is kept.
    pub fn resolve(&self, cursor: usize, len: usize) -> Option<Range<usize>> {
        let start = usize::try_from(self.byte_start).ok()?;
        let end = usize::try_from(self.byte_end).ok()?;
        if start < cursor || end > len || end < start {
            return None;
        }
        Some(start..end)
    }
}

/// Facet feature. Only the first feature of a facet is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    #[serde(alias = "pub.leaflet.richtext.facet#link")]
    Link { uri: Option<String> },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    #[serde(alias = "pub.leaflet.richtext.facet#didMention")]
    Mention { did: Option<String> },
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: Option<String> },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteRange,
    #[serde(default)]
    pub features: Vec<FacetFeature>,
}

impl Facet {
    pub fn new(start: i64, end: i64, feature: FacetFeature) -> Self {
        Self {
            index: ByteRange::new(start, end),
            features: vec![feature],
        }
    }

    /// Parse a `facets` array leniently: facets that fail to deserialize are
    /// dropped one by one, the rest survive.
    pub fn parse_all(value: Option<&Value>) -> Vec<Facet> {
        let Some(items) = value.and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match Facet::deserialize(item) {
                Ok(facet) => Some(facet),
                Err(e) => {
                    trace!(error = %e, "dropping malformed facet");
                    None
                }
            })
            .collect()
    }

    fn primary_feature(&self) -> Option<&FacetFeature> {
        self.features.first()
    }
}

/// One span of segmented text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Byte range in the source text.
    pub range: Range<usize>,
    /// Decoded span text (unescaped).
    pub text: Cow<'a, str>,
    /// `None` for plain spans; for facet spans, the facet's first feature.
    pub feature: Option<&'a FacetFeature>,
}

/// Slice `text` into ordered spans according to `facets`.
///
/// Facets are stably sorted by start offset. A facet is skipped when it starts
/// before the end of the previously consumed facet, ends past the text, or is
/// inverted; its bytes then fall into the surrounding plain span.
pub fn segment<'a>(text: &'a str, facets: &'a [Facet]) -> Vec<Segment<'a>> {
    let bytes = text.as_bytes();
    let len = bytes.len();

    let mut sorted: Vec<&Facet> = facets.iter().collect();
    sorted.sort_by_key(|f| f.index.byte_start);

    let mut segments = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0;

    for facet in sorted {
        let Some(range) = facet.index.resolve(cursor, len) else {
            trace!(
                byte_start = facet.index.byte_start,
                byte_end = facet.index.byte_end,
                cursor,
                len,
                "skipping facet outside usable range"
            );
            continue;
        };

        if range.start > cursor {
            segments.push(Segment {
                range: cursor..range.start,
                text: String::from_utf8_lossy(&bytes[cursor..range.start]),
                feature: None,
            });
        }
        cursor = range.end;
        segments.push(Segment {
            text: String::from_utf8_lossy(&bytes[range.clone()]),
            range,
            feature: facet.primary_feature(),
        });
    }

    if cursor < len {
        segments.push(Segment {
            range: cursor..len,
            text: String::from_utf8_lossy(&bytes[cursor..]),
            feature: None,
        });
    }

    segments
}

/// Render text with facets to escaped HTML.
pub fn render_rich_text(text: &str, facets: &[Facet]) -> String {
    if facets.is_empty() {
        return escape_html(text);
    }

    let mut html = String::with_capacity(text.len());
    for seg in segment(text, facets) {
        write_segment(&mut html, &seg);
    }
    html
}

fn write_segment(html: &mut String, seg: &Segment<'_>) {
    let escaped = escape_html(&seg.text);
    match seg.feature {
        Some(FacetFeature::Link { uri: Some(uri) }) if is_http_url(uri) => {
            html.push_str("<a href=\"");
            html.push_str(&escape_html(uri));
            html.push_str("\" target=\"_blank\" rel=\"noopener\">");
            html.push_str(&escaped);
            html.push_str("</a>");
        }
        Some(FacetFeature::Mention { did: Some(did) }) if !did.is_empty() => {
            let handle = seg.text.strip_prefix('@').unwrap_or(&seg.text);
            html.push_str("<a href=\"/");
            html.push_str(&escape_html(handle));
            html.push_str("\">");
            html.push_str(&escaped);
            html.push_str("</a>");
        }
        Some(FacetFeature::Tag { .. }) => {
            html.push_str("<span class=\"tag\">");
            html.push_str(&escaped);
            html.push_str("</span>");
        }
        _ => html.push_str(&escaped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(uri: &str) -> FacetFeature {
        FacetFeature::Link {
            uri: Some(uri.to_string()),
        }
    }

    fn mention() -> FacetFeature {
        FacetFeature::Mention {
            did: Some("did:plc:xyz".to_string()),
        }
    }

    fn tag(t: &str) -> FacetFeature {
        FacetFeature::Tag {
            tag: Some(t.to_string()),
        }
    }

    #[test]
    fn test_no_facets_is_escaped_text() {
        assert_eq!(
            render_rich_text("a <b> & \"c\"", &[]),
            "a &lt;b&gt; &amp; &quot;c&quot;"
        );
    }

    #[test]
    fn test_mention_strips_at_in_href_only() {
        let text = "hi @bob.bsky.social!";
        let facets = vec![Facet::new(3, 19, mention())];
        assert_eq!(
            render_rich_text(text, &facets),
            "hi <a href=\"/bob.bsky.social\">@bob.bsky.social</a>!"
        );
    }

    #[test]
    fn test_mention_without_did_is_plain() {
        let text = "hi @bob";
        let facets = vec![Facet::new(3, 7, FacetFeature::Mention { did: None })];
        assert_eq!(render_rich_text(text, &facets), "hi @bob");
    }

    #[test]
    fn test_mention_with_empty_did_is_plain() {
        let text = "@bob";
        let facets = vec![Facet::new(
            0,
            4,
            FacetFeature::Mention {
                did: Some(String::new()),
            },
        )];
        assert_eq!(render_rich_text(text, &facets), "@bob");
    }

    #[test]
    fn test_link_facet() {
        let text = "click here for more";
        let facets = vec![Facet::new(6, 10, link("https://example.com/?a=1&b=2"))];
        insta::assert_snapshot!(
            render_rich_text(text, &facets),
            @r#"click <a href="https://example.com/?a=1&amp;b=2" target="_blank" rel="noopener">here</a> for more"#
        );
    }

    #[test]
    fn test_non_http_link_is_plain_text() {
        let text = "do not click";
        let facets = vec![Facet::new(7, 12, link("javascript:alert(1)"))];
        assert_eq!(render_rich_text(text, &facets), "do not click");
    }

    #[test]
    fn test_tag_facet() {
        let text = "love #rust";
        let facets = vec![Facet::new(5, 10, tag("rust"))];
        assert_eq!(
            render_rich_text(text, &facets),
            "love <span class=\"tag\">#rust</span>"
        );
    }

    #[test]
    fn test_unknown_feature_and_empty_features_render_plain() {
        let text = "abc def";
        let facets = vec![
            Facet::new(0, 3, FacetFeature::Unknown),
            Facet {
                index: ByteRange::new(4, 7),
                features: vec![],
            },
        ];
        assert_eq!(render_rich_text(text, &facets), "abc def");
    }

    #[test]
    fn test_multibyte_offsets_are_bytes() {
        // "🦀 " is 5 bytes, "café" is 5 bytes.
        let text = "🦀 café #tag";
        let facets = vec![
            Facet::new(5, 10, link("https://cafe.example")),
            Facet::new(11, 15, tag("tag")),
        ];
        assert_eq!(
            render_rich_text(text, &facets),
            "🦀 <a href=\"https://cafe.example\" target=\"_blank\" rel=\"noopener\">café</a> <span class=\"tag\">#tag</span>"
        );
    }

    #[test]
    fn test_unsorted_facets_are_sorted() {
        let text = "one two";
        let facets = vec![Facet::new(4, 7, tag("two")), Facet::new(0, 3, tag("one"))];
        assert_eq!(
            render_rich_text(text, &facets),
            "<span class=\"tag\">one</span> <span class=\"tag\">two</span>"
        );
    }

    #[test]
    fn test_overlapping_facet_is_skipped() {
        let text = "abcdefgh";
        let facets = vec![Facet::new(0, 5, tag("a")), Facet::new(3, 8, tag("b"))];
        assert_eq!(
            render_rich_text(text, &facets),
            "<span class=\"tag\">abcde</span>fgh"
        );
    }

    #[test]
    fn test_equal_start_first_in_input_wins() {
        let text = "abcdef";
        let facets = vec![
            Facet::new(0, 3, tag("abc")),
            Facet::new(0, 6, link("https://a.example")),
        ];
        assert_eq!(
            render_rich_text(text, &facets),
            "<span class=\"tag\">abc</span>def"
        );

        let facets = vec![
            Facet::new(0, 6, link("https://a.example")),
            Facet::new(0, 3, tag("abc")),
        ];
        assert_eq!(
            render_rich_text(text, &facets),
            "<a href=\"https://a.example\" target=\"_blank\" rel=\"noopener\">abcdef</a>"
        );
    }

    #[test]
    fn test_zero_width_facet_emits_empty_wrapper() {
        let text = "abcd";
        let facets = vec![Facet::new(2, 2, tag("x"))];
        assert_eq!(
            render_rich_text(text, &facets),
            "ab<span class=\"tag\"></span>cd"
        );
    }

    #[test]
    fn test_out_of_range_facet_is_skipped() {
        let text = "short";
        let facets = vec![Facet::new(2, 50, tag("x"))];
        assert_eq!(render_rich_text(text, &facets), "short");

        let facets = vec![Facet::new(0, 6, tag("x"))];
        assert_eq!(render_rich_text(text, &facets), "short");
    }

    #[test]
    fn test_inverted_and_negative_ranges_are_skipped() {
        let text = "abcdefgh";
        let facets = vec![Facet::new(5, 3, tag("x"))];
        assert_eq!(render_rich_text(text, &facets), "abcdefgh");

        let facets = vec![Facet::new(-2, 3, tag("x"))];
        assert_eq!(render_rich_text(text, &facets), "abcdefgh");
    }

    #[test]
    fn test_facet_splitting_a_codepoint_does_not_panic() {
        // Byte 1 is inside the crab emoji.
        let text = "🦀x";
        let facets = vec![Facet::new(1, 4, tag("x"))];
        let html = render_rich_text(text, &facets);
        assert!(html.contains("<span class=\"tag\">"));
        assert!(html.ends_with("x"));
    }

    #[test]
    fn test_segments_cover_every_byte_in_order() {
        let text = "héllo @wörld #tag https://x.example";
        let facets = vec![
            Facet::new(26, 37, link("https://x.example")),
            Facet::new(7, 14, mention()),
            Facet::new(10, 20, tag("bad overlap")),
            Facet::new(21, 25, tag("tag")),
            Facet::new(30, 99, tag("out of range")),
        ];
        let segments = segment(text, &facets);

        let mut expected_start = 0;
        let mut rebuilt = String::new();
        for seg in &segments {
            assert_eq!(seg.range.start, expected_start);
            expected_start = seg.range.end;
            rebuilt.push_str(&seg.text);
        }
        assert_eq!(expected_start, text.len());
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_parse_all_drops_only_malformed_facets() {
        let value = serde_json::json!([
            {
                "index": {"byteStart": 0, "byteEnd": 4},
                "features": [{"$type": "app.bsky.richtext.facet#tag", "tag": "rust"}]
            },
            {"index": "garbage"},
            {
                "index": {"byteStart": 5, "byteEnd": 9},
                "features": [{"$type": "com.example.facet#sparkle"}]
            }
        ]);
        let facets = Facet::parse_all(Some(&value));
        assert_eq!(facets.len(), 2);
        assert_eq!(
            facets[0].features[0],
            FacetFeature::Tag {
                tag: Some("rust".into())
            }
        );
        assert_eq!(facets[1].features[0], FacetFeature::Unknown);
    }

    #[test]
    fn test_parse_all_accepts_leaflet_aliases() {
        let value = serde_json::json!([{
            "index": {"byteStart": 0, "byteEnd": 4},
            "features": [{"$type": "pub.leaflet.richtext.facet#link", "uri": "https://a.example"}]
        }]);
        let facets = Facet::parse_all(Some(&value));
        assert_eq!(facets[0].features[0], link("https://a.example"));
    }

    #[test]
    fn test_parse_all_non_array_is_empty() {
        assert!(Facet::parse_all(None).is_empty());
        assert!(Facet::parse_all(Some(&serde_json::json!({"a": 1}))).is_empty());
    }
}
