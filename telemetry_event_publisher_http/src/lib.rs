use async_trait::async_trait;
use telemetry_shared::config::config;
use telemetry_shared::error::PublishError;
use telemetry_shared::event_publisher::EventPublisher;
use telemetry_shared::model::TelemetryRecord;
use tracing::{info, warn};

/// Header carrying the partition key so the receiving hub can keep records
/// of one vehicle on one partition.
pub const PARTITION_KEY_HEADER: &str = "x-partition-key";

/// An event publisher that dispatches telemetry records to an HTTP endpoint.
#[derive(Debug)]
pub struct HttpEventPublisher {
    pub target_url: String,
    pub max_retries: u32,
    client: reqwest::Client,
}

impl HttpEventPublisher {
    pub fn new(target_url: String, max_retries: u32) -> Self {
        HttpEventPublisher {
            target_url,
            max_retries,
            client: reqwest::Client::new(),
        }
    }

    /// Builds the publisher from the application configuration, or `None`
    /// when the HTTP publisher is absent or disabled.
    pub fn from_config() -> Option<Self> {
        let http = config().event_publishers.as_ref()?.http.as_ref()?.clone();

        http.enabled
            .then(|| HttpEventPublisher::new(http.target_url, http.max_retries))
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, record: &TelemetryRecord) -> Result<(), PublishError> {
        if record.car_id.is_empty() {
            return Err(PublishError::MissingPartitionKey);
        }

        let attempts = self.max_retries.max(1);

        for attempt in 1..=attempts {
            info!(
                attempt,
                attempts,
                car_id = %record.car_id,
                "Sending record to the event endpoint"
            );

            match self
                .client
                .post(&self.target_url)
                .header(PARTITION_KEY_HEADER, &record.car_id)
                .json(record)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!(car_id = %record.car_id, "Record delivered to the event endpoint");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    warn!(attempt, status, "Event endpoint rejected the record");
                    if attempt == attempts {
                        return Err(PublishError::Rejected(status));
                    }
                }
                Err(err) => {
                    warn!(attempt, "Failed to reach the event endpoint: {err}");
                    if attempt == attempts {
                        return Err(PublishError::Transport(err.to_string()));
                    }
                }
            }
        }

        unreachable!("the retry loop always returns on its last attempt")
    }
}
