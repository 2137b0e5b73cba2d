use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The one-field payload used on both wires: browser to gateway and gateway
/// to data server. Serializes exactly as `{"trayecto": "<value>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayectoRequest {
    pub trayecto: String,
}

/// One telemetry sample. Everything besides `car_id` is opaque to the
/// pipeline and carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub car_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One line on the data-server wire: a record, or a terminal error report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamFrame {
    Error { error: String },
    Record(TelemetryRecord),
}
