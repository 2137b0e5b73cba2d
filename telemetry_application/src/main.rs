use std::sync::Arc;

use telemetry_api_rest::{app, ApplicationState};
use telemetry_event_publisher_http::HttpEventPublisher;
use telemetry_shared::config::{config, LogFormat};
use telemetry_shared::event_publisher::{EventPublisherHandle, NoopEventPublisher};
use telemetry_stream::StreamClient;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let event_publisher: EventPublisherHandle = match HttpEventPublisher::from_config() {
        Some(publisher) => {
            info!("HTTP event publisher enabled, target: {}", publisher.target_url);
            Arc::new(publisher)
        }
        None => {
            info!("No event publisher configured, records will be dropped");
            Arc::new(NoopEventPublisher)
        }
    };

    let state = ApplicationState {
        stream_client: StreamClient::from_config(),
        event_publisher,
    };

    let mut app = app(state);
    if config().cors_enabled.unwrap_or(false) {
        info!("CORS enabled");
        app = app.layer(CorsLayer::permissive());
    }

    let address = bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .expect("failed to bind the gateway address");
    info!("Gateway listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("gateway failed");
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());

    match config().log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

fn bind_address() -> String {
    let url = config().url.parse::<url::Url>().expect("invalid `url` in configuration");

    format!(
        "{}:{}",
        url.host_str().expect("`url` has no host"),
        url.port().unwrap_or(3033)
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
