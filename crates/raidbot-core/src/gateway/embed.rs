//! The embeddable chat widget served at `/embed.js`.

const WIDGET_TEMPLATE: &str = include_str!("../../assets/widget.js");
const API_URL_PLACEHOLDER: &str = "__CHAT_API_URL__";

/// Render the widget script pointing at `api_url`.
pub fn render_widget(api_url: &str) -> String {
    // The URL lands inside a single-quoted JS string.
    let escaped = api_url.replace('\\', "\\\\").replace('\'', "\\'");
    WIDGET_TEMPLATE.replace(API_URL_PLACEHOLDER, &escaped)
}
