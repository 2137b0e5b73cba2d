use std::time::Duration;

use telemetry_shared::config::config;
use telemetry_shared::model::{StreamFrame, TelemetryRecord, TrayectoRequest};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::info;

use crate::error::StreamError;

/// Gateway-side handle to the data server.
#[derive(Clone, Debug)]
pub struct StreamClient {
    address: String,
    connect_timeout: Option<Duration>,
}

impl StreamClient {
    pub fn new(address: String, connect_timeout: Option<Duration>) -> Self {
        StreamClient {
            address,
            connect_timeout,
        }
    }

    pub fn from_config() -> Self {
        let config = config();

        StreamClient::new(
            config.data_server.address(),
            config.external_server_response_timeout_ms.map(Duration::from_millis),
        )
    }

    /// Opens a stream for the given trayecto. Records arrive one by one via
    /// [`RecordStream::next_record`]; the server closes the connection after
    /// the last one.
    pub async fn start(&self, trayecto: &str) -> Result<RecordStream, StreamError> {
        info!("Connecting to the data server at {}", self.address);
        let mut stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(&self.address))
                .await
                .map_err(|_| StreamError::Timeout)??,
            None => TcpStream::connect(&self.address).await?,
        };

        let mut request = serde_json::to_vec(&TrayectoRequest {
            trayecto: trayecto.to_string(),
        })?;
        request.push(b'\n');
        stream.write_all(&request).await?;
        info!("Trayecto request sent to the data server: {trayecto}");

        Ok(RecordStream {
            lines: BufReader::new(stream).lines(),
        })
    }
}

/// One open trayecto stream.
pub struct RecordStream {
    lines: Lines<BufReader<TcpStream>>,
}

impl RecordStream {
    /// Returns the next record, `None` at the end of the stream, or the
    /// server's error report as [`StreamError::Server`].
    pub async fn next_record(&mut self) -> Result<Option<TelemetryRecord>, StreamError> {
        loop {
            let line = match self.lines.next_line().await? {
                Some(line) => line,
                None => return Ok(None),
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StreamFrame>(&line)? {
                StreamFrame::Error { error } => return Err(StreamError::Server(error)),
                StreamFrame::Record(record) => return Ok(Some(record)),
            }
        }
    }

    /// Drains the stream into memory. Mostly useful in tests.
    pub async fn collect(mut self) -> Result<Vec<TelemetryRecord>, StreamError> {
        let mut records = Vec::new();

        while let Some(record) = self.next_record().await? {
            records.push(record);
        }

        Ok(records)
    }
}
