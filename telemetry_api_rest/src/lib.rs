mod health;
mod index;
mod start;

use axum::routing::{get, post};
use axum::Router;
use telemetry_shared::event_publisher::EventPublisherHandle;
use telemetry_stream::StreamClient;
use tower_http::trace::TraceLayer;

use health::health;
use index::index;
use start::start;

#[derive(Clone)]
pub struct ApplicationState {
    pub stream_client: StreamClient,
    pub event_publisher: EventPublisherHandle,
}

pub fn app(state: ApplicationState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/start", post(start))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
