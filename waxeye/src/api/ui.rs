//! Page rendering
//!
//! One embedded template, a list of action cards, and a deliberately vague
//! failure page. Detailed errors go to the log, never to the browser.

use axum::http::StatusCode;
use axum::response::Html;

const PAGE_TEMPLATE: &str = include_str!("../ui/page.html");

/// Something the operator can click on
pub struct Action {
    pub text: String,
    pub path: String,
}

/// Render the page template with a title and a list of action cards
pub fn render_page(title: &str, actions: &[Action]) -> Html<String> {
    let mut items = String::new();
    for action in actions {
        items.push_str(&format!(
            "<div class=\"card\"><p>{}</p><a href=\"{}\">Let's do it!</a></div>\n",
            escape(&action.text),
            escape(&action.path),
        ));
    }

    Html(
        PAGE_TEMPLATE
            .replace("{{title}}", &escape(title))
            .replace("{{items}}", &items),
    )
}

/// The generic user-facing failure page
pub fn failure_page() -> (StatusCode, Html<String>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        render_page("Oops, something went wrong...", &[]),
    )
}

/// Minimal HTML escaping for interpolated text and attribute values
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
