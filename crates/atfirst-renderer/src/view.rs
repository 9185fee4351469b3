//! The normalized item view and the post card renderer.

use crate::escape::escape_html;

/// One displayable item, built once per record and rendered once.
///
/// `body` and `embed` hold HTML that the builder has already escaped; every
/// other string is plain text and is escaped on render. Absent fields omit
/// their region of the card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemView {
    pub date: Option<String>,
    pub date_href: Option<String>,
    pub title: Option<String>,
    pub title_href: Option<String>,
    pub body: Option<String>,
    pub author: Option<ItemAuthor>,
    pub stats: Option<ItemStats>,
    pub embed: Option<String>,
    pub reply_context: Option<ReplyContext>,
    pub meta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemAuthor {
    pub name: String,
    pub handle: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemStats {
    pub replies: u64,
    pub reposts: u64,
    pub likes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplyContext {
    pub name: String,
    pub href: String,
    pub text: String,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

fn render_date(html: &mut String, iso: &str, href: Option<&str>) {
    let day: String = iso.chars().take(10).collect();
    html.push_str("<time class=\"post-date\" datetime=\"");
    html.push_str(&escape_html(iso));
    html.push_str("\">");
    match href {
        Some(href) => {
            html.push_str("<a href=\"");
            html.push_str(&escape_html(href));
            html.push_str("\" target=\"_blank\" rel=\"noopener\">");
            html.push_str(&escape_html(&day));
            html.push_str("</a>");
        }
        None => html.push_str(&escape_html(&day)),
    }
    html.push_str("</time>");
}

/// Render an item as an `<article class="post">` card.
pub fn render_item(view: &ItemView) -> String {
    let mut html = String::from("<article class=\"post\">");
    let date = non_empty(&view.date);
    let date_href = non_empty(&view.date_href);

    if let Some(author) = &view.author {
        if let Some(avatar) = author.avatar.as_deref().filter(|a| !a.is_empty()) {
            html.push_str("<img class=\"avatar\" src=\"");
            html.push_str(&escape_html(avatar));
            html.push_str("\" alt=\"\" width=\"40\" height=\"40\">");
        }
        html.push_str("<div class=\"author\">");
        html.push_str(&escape_html(&author.name));
        html.push_str(" <span class=\"handle\">@");
        html.push_str(&escape_html(&author.handle));
        html.push_str("</span></div>");
        if let Some(date) = date {
            render_date(&mut html, date, date_href);
        }
    }

    if let Some(ctx) = &view.reply_context {
        html.push_str("<div class=\"reply-ctx\">Replying to <a href=\"");
        html.push_str(&escape_html(&ctx.href));
        html.push_str("\">");
        html.push_str(&escape_html(&ctx.name));
        html.push_str("</a></div>");
        html.push_str("<div class=\"reply-parent\">");
        html.push_str(&escape_html(&ctx.text));
        html.push_str("</div>");
    }

    if let Some(title) = non_empty(&view.title) {
        html.push_str("<h2 class=\"post-title\">");
        match non_empty(&view.title_href) {
            Some(href) => {
                html.push_str("<a href=\"");
                html.push_str(&escape_html(href));
                html.push_str("\" target=\"_blank\" rel=\"noopener\">");
                html.push_str(&escape_html(title));
                html.push_str("</a>");
            }
            None => html.push_str(&escape_html(title)),
        }
        html.push_str("</h2>");
    }

    if let (None, Some(date)) = (&view.author, date) {
        render_date(&mut html, date, date_href);
    }

    if let Some(body) = non_empty(&view.body) {
        html.push_str("<div class=\"body\">");
        html.push_str(body);
        html.push_str("</div>");
    }

    if let Some(embed) = non_empty(&view.embed) {
        html.push_str(embed);
    }

    if let Some(meta) = non_empty(&view.meta) {
        html.push_str("<div class=\"meta\">");
        html.push_str(&escape_html(meta));
        html.push_str("</div>");
    }

    if let Some(stats) = &view.stats {
        html.push_str(&format!(
            "<div class=\"stats\">{} replies · {} reposts · {} likes</div>",
            stats.replies, stats.reposts, stats.likes
        ));
    }

    html.push_str("</article>");
    html
}
