use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("record is missing a car_id to use as partition key")]
    MissingPartitionKey,
    #[error("event endpoint returned status {0}")]
    Rejected(u16),
    #[error("failed to reach event endpoint: {0}")]
    Transport(String),
}
