pub mod client;
pub mod error;
pub mod server;

pub use client::{RecordStream, StreamClient};
pub use error::StreamError;
pub use server::DataServer;
