use std::time::Duration;

use telemetry_stream::DataServer;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let data_server = telemetry_shared::config::config().data_server.clone();

    let server = DataServer::new(
        &data_server.trayecto_dir,
        Duration::from_millis(data_server.stream_interval_ms),
    )
    .expect("trayecto directory must exist");

    let listener = TcpListener::bind(data_server.address())
        .await
        .expect("failed to bind the data server address");

    server.serve(listener).await.expect("data server failed");
}
