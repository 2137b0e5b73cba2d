use axum::Json;
use serde_json::{json, Value};

#[axum_macros::debug_handler]
pub(crate) async fn health() -> Json<Value> {
    Json(json!({
        "status": "UP"
    }))
}

#[cfg(test)]
mod tests {
    use crate::app;
    use crate::tests::test_state;

    use axum::body::Body;
    use axum::http::{self, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = app(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method(http::Method::GET)
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"status": "UP"}));
    }
}
