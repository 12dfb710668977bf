// Minimal HTTP endpoint so the hosting platform sees the process as alive.

use axum::routing::get;
use axum::Router;

pub const KEEPALIVE_BODY: &str = "Bot is running! ✅";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { KEEPALIVE_BODY }))
}

/// Bind `0.0.0.0:<port>` and serve until the process exits.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "🌐 Web server running");
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_reports_running() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], KEEPALIVE_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_other_paths_are_not_found() {
        let response = router()
            .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
