use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("failed to talk to the data server: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out connecting to the data server")]
    Timeout,
    #[error("received a malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
    #[error("{0}")]
    Server(String),
}
