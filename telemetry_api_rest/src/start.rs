use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::ApplicationState;

/// Starts a trayecto: fetches its record stream from the data server and
/// forwards every record to the configured event publisher.
#[axum_macros::debug_handler]
pub(crate) async fn start(State(state): State<ApplicationState>, Json(payload): Json<Value>) -> impl IntoResponse {
    info!("Received start request: {payload:?}");

    let trayecto = match payload["trayecto"].as_str() {
        Some(trayecto) if !trayecto.is_empty() => trayecto.to_string(),
        _ => {
            warn!("Returning 400: no trayecto in the request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "trayecto is required"})),
            )
                .into_response();
        }
    };
    info!("Starting trayecto: {trayecto}");

    let mut records = match state.stream_client.start(&trayecto).await {
        Ok(records) => records,
        Err(err) => {
            error!("Failed to start the trayecto stream: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": err.to_string()})),
            )
                .into_response();
        }
    };

    let mut forwarded = 0usize;
    loop {
        match records.next_record().await {
            Ok(Some(record)) => {
                if let Err(err) = state.event_publisher.publish(&record).await {
                    error!("Failed to publish a record: {err}");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": err.to_string()})),
                    )
                        .into_response();
                }
                forwarded += 1;
            }
            Ok(None) => break,
            Err(err) => {
                error!("Trayecto stream failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": err.to_string()})),
                )
                    .into_response();
            }
        }
    }
    info!("Forwarded {forwarded} records for trayecto '{trayecto}'");

    (
        StatusCode::OK,
        Json(json!({"message": format!("Trayecto '{trayecto}' data sent to the event hub")})),
    )
        .into_response()
}
