//! Template renderer for the studio.
//!
//! The studio uses a single HTML template (`studio/assets/studio.html`) with
//! placeholder tokens like `{{TOKEN}}`, loaded at compile time. Handlers
//! fill their placeholders through the closure passed to `render_page`;
//! anything left unfilled is blanked.

const TEMPLATE: &str = include_str!("assets/studio.html");

/// Renders the full studio page.
///
/// # Arguments
/// - `model_name`: shown in the header
/// - `fill`:       closure that fills page-specific placeholders
pub fn render_page<F>(model_name: &str, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let mut html = TEMPLATE.to_owned();
    html = html.replace("{{MODEL_NAME}}", &html_escape(model_name));
    html = fill(html);
    blank_remaining(html)
}

/// Replaces any `{{UPPERCASE_TOKEN}}` that wasn't already substituted with an
/// empty string, so a missed token never reaches the browser.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

/// Escapes text for HTML. Braces are encoded too, so user text can never
/// form a `{{TOKEN}}` that the renderer would substitute or blank.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
     .replace('{', "&#123;")
     .replace('}', "&#125;")
}
