// Plain HTTP routes served next to the websocket endpoint.

use axum::response::Html;

const INDEX_PAGE: &str = r#"<!doctype html>
<html>
  <head><title>grav</title></head>
  <body>
    <p>Connect a websocket client to <code>/game</code> to join the universe.</p>
  </body>
</html>
"#;

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}
