use axum::response::Html;

// Embedded at compile time; the page talks only to /api/upload and /api/uploads.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
