use std::sync::Arc;

use telemetry_console::form::FormSubmissionHandler;
use telemetry_console::handles::{ConsoleInput, ConsoleOutput, SubmitEvent};
use tokio::io::AsyncBufReadExt;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let gateway =
        std::env::var("TELEMETRY_GATEWAY_URL").unwrap_or_else(|_| "http://127.0.0.1:3033".to_string());
    let endpoint = Url::parse(&gateway)
        .and_then(|url| url.join("/start"))
        .expect("invalid gateway URL");

    let input = Arc::new(ConsoleInput::new());
    let handler = FormSubmissionHandler::new(endpoint, input.clone(), Arc::new(ConsoleOutput));

    println!("Enter a trayecto (for example \"Trayecto 1\") and press Enter:");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        input.set_value(&line);

        let mut event = SubmitEvent::new();
        if let Err(err) = handler.handle_submit(&mut event).await {
            // The handler leaves failures unhandled; report the dropped
            // error the way a browser console would.
            error!("Unhandled submission failure: {err}");
        }
    }
}
