//! Boundary-aware truncation for plain text and markdown.
//!
//! Lengths are counted in Unicode scalar values, so a cut never lands inside
//! a multi-byte character.

use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::escape::is_http_url;

/// Last sentence end in a string: terminal punctuation, whitespace, then no
/// further terminal punctuation.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?。]\s[^.!?。]*$").unwrap());

const ELLIPSIS: char = '…';

/// Shorten `text` to roughly `limit` characters, preferring a paragraph,
/// sentence or word boundary over a hard cut.
pub fn truncate_text(text: &str, limit: usize) -> String {
    let Some((cut_at, _)) = text.char_indices().nth(limit) else {
        return text.to_string();
    };
    let cut = &text[..cut_at];
    let past = |byte: usize, fraction: f64| cut[..byte].chars().count() as f64 > limit as f64 * fraction;

    if let Some(p) = cut.rfind("\n\n").filter(|&p| past(p, 0.3)) {
        return format!("{}\n\n{ELLIPSIS}", &cut[..p]);
    }

    if let Some(m) = SENTENCE_END.find(cut).filter(|m| past(m.start(), 0.3)) {
        let punct = cut[m.start()..].chars().next().map_or(1, char::len_utf8);
        return format!("{} {ELLIPSIS}", &cut[..m.start() + punct]);
    }

    if let Some(p) = cut.rfind(' ').filter(|&p| past(p, 0.5)) {
        return format!("{} {ELLIPSIS}", &cut[..p]);
    }

    format!("{cut}{ELLIPSIS}")
}

/// Render markdown to HTML, keeping at most `limit` characters of text.
///
/// Truncation happens on the event stream: the text event that crosses the
/// limit is cut and gets the ellipsis, everything after it is dropped, and
/// every still-open element is closed. Raw HTML is never passed through.
pub fn truncate_markdown(markdown: &str, limit: usize) -> String {
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut open: Vec<TagEnd> = Vec::new();
    let mut remaining = limit;

    for event in Parser::new_ext(markdown, Options::empty()) {
        match event {
            Event::Start(tag) => {
                open.push(tag.to_end());
                events.push(Event::Start(neutralize_links(tag)));
            }
            Event::End(end) => {
                open.pop();
                events.push(Event::End(end));
            }
            Event::Text(text) => match fit(&text, &mut remaining) {
                None => events.push(Event::Text(text)),
                Some(cut) => {
                    events.push(Event::Text(cut.into()));
                    break;
                }
            },
            Event::Code(code) => match fit(&code, &mut remaining) {
                None => events.push(Event::Code(code)),
                Some(cut) => {
                    events.push(Event::Code(cut.into()));
                    break;
                }
            },
            Event::Html(_) | Event::InlineHtml(_) => {}
            other => events.push(other),
        }
    }

    while let Some(end) = open.pop() {
        events.push(Event::End(end));
    }

    let mut html = String::with_capacity(markdown.len());
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}

/// `None` if `text` fits in the remaining budget (which is then spent),
/// otherwise the cut text with the ellipsis appended.
fn fit(text: &str, remaining: &mut usize) -> Option<String> {
    let len = text.chars().count();
    if len <= *remaining {
        *remaining -= len;
        return None;
    }
    let mut cut: String = text.chars().take(*remaining).collect();
    cut.push(ELLIPSIS);
    *remaining = 0;
    Some(cut)
}

/// Strip link and image targets that could run script.
fn neutralize_links(tag: Tag<'_>) -> Tag<'_> {
    match tag {
        Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Link {
            link_type,
            dest_url: safe_dest(dest_url),
            title,
            id,
        },
        Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Image {
            link_type,
            dest_url: safe_dest(dest_url),
            title,
            id,
        },
        other => other,
    }
}

/// Relative targets and http(s) URLs pass; anything with another scheme
/// is emptied.
fn safe_dest(dest: CowStr<'_>) -> CowStr<'_> {
    let has_scheme = dest
        .split(['/', '?', '#'])
        .next()
        .is_some_and(|head| head.contains(':'));
    if has_scheme && !is_http_url(&dest) {
        CowStr::Borrowed("")
    } else {
        dest
    }
}
