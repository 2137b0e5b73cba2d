use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PublishError;
use crate::model::TelemetryRecord;

/// Seam between the gateway and whatever receives the telemetry records.
#[async_trait]
pub trait EventPublisher {
    async fn publish(&self, record: &TelemetryRecord) -> Result<(), PublishError>;
}

pub type EventPublisherHandle = Arc<dyn EventPublisher + Send + Sync>;

/// Used when no event publisher is configured. Records are dropped.
#[derive(Debug, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, _record: &TelemetryRecord) -> Result<(), PublishError> {
        Ok(())
    }
}
