//! Page shell: head, stylesheet, lookup form and the feed region.

use atfirst_renderer::{ItemView, escape_html, render_item};

const STYLE: &str = include_str!("../assets/style.css");

/// What goes below the form.
#[derive(Debug, Clone, Copy)]
pub enum FeedSection<'a> {
    /// No actor requested yet.
    Empty,
    Items(&'a [ItemView]),
    Error(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub actor: Option<&'a str>,
    pub collection: &'a str,
    /// `(id, label)` pairs for the collection picker.
    pub options: &'a [(String, String)],
    pub feed: FeedSection<'a>,
}

fn head(title: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body>",
        escape_html(title)
    )
}

fn form(html: &mut String, actor: &str, collection: &str, options: &[(String, String)]) {
    html.push_str("<form action=\"/\" method=\"get\" class=\"form-row\">");
    html.push_str("<input name=\"actor\" placeholder=\"handle.bsky.social\" value=\"");
    html.push_str(&escape_html(actor));
    html.push_str("\" aria-label=\"Handle or DID\" required>");
    html.push_str("<select name=\"collection\" aria-label=\"Collection\">");
    for (id, label) in options {
        html.push_str("<option value=\"");
        html.push_str(&escape_html(id));
        html.push('"');
        if id == collection {
            html.push_str(" selected");
        }
        html.push('>');
        html.push_str(&escape_html(label));
        html.push_str("</option>");
    }
    html.push_str("</select><button type=\"submit\">Go</button></form>");
}

pub fn render_page(page: &Page<'_>) -> String {
    let title = match page.actor {
        Some(actor) => format!("@{actor} - at first"),
        None => "at first".to_string(),
    };

    let mut html = head(&title);
    html.push_str("<h1>at first</h1>");
    form(
        &mut html,
        page.actor.unwrap_or_default(),
        page.collection,
        page.options,
    );

    match page.feed {
        FeedSection::Empty => {}
        FeedSection::Items([]) => html.push_str("<p>No records found.</p>"),
        FeedSection::Items(items) => {
            for item in items {
                html.push_str(&render_item(item));
            }
        }
        FeedSection::Error(message) => {
            html.push_str("<p class=\"error\">");
            html.push_str(&escape_html(message));
            html.push_str("</p>");
        }
    }

    html.push_str("</body></html>");
    html
}
