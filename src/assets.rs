use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

const SW_CONTENT: &str = include_str!("../static/sw.js");

pub(crate) async fn service_worker() -> Response {
    (
        [
            (CONTENT_TYPE, "application/javascript"),
            (CACHE_CONTROL, "no-cache"),
        ],
        SW_CONTENT,
    )
        .into_response()
}
