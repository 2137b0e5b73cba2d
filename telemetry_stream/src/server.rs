use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use telemetry_shared::model::{StreamFrame, TelemetryRecord, TrayectoRequest};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Streams the records of a selected trayecto to each client, one JSON frame
/// per line, pacing the frames with the configured interval.
///
/// A vehicle can only run one trayecto at a time: the server keeps a registry
/// of active `car_id`s and refuses a second stream for the same vehicle until
/// the first one ends.
#[derive(Clone, Debug)]
pub struct DataServer {
    trayecto_dir: PathBuf,
    stream_interval: Duration,
    active_cars: Arc<Mutex<HashSet<String>>>,
}

impl DataServer {
    /// Fails when the trayecto directory does not exist.
    pub fn new(trayecto_dir: impl Into<PathBuf>, stream_interval: Duration) -> io::Result<Self> {
        let trayecto_dir = trayecto_dir.into();

        if !trayecto_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("trayecto directory not found: {}", trayecto_dir.display()),
            ));
        }

        Ok(DataServer {
            trayecto_dir,
            stream_interval,
            active_cars: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        info!("Data server listening on {}", listener.local_addr()?);

        loop {
            let (stream, peer) = listener.accept().await?;
            let server = self.clone();

            let span = info_span!("connection", id = %Uuid::new_v4(), %peer);
            tokio::spawn(
                async move {
                    if let Err(err) = server.handle_connection(stream, peer).await {
                        error!("Connection failed: {err}");
                    }
                }
                .instrument(span),
            );
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> io::Result<()> {
        info!("Connection established with {peer}");

        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        let request = match lines.next_line().await? {
            Some(line) => line,
            None => return Ok(()),
        };

        let trayecto = match serde_json::from_str::<TrayectoRequest>(&request) {
            Ok(request) => request.trayecto,
            Err(err) => {
                warn!("Malformed request: {err}");
                return send_error(&mut write_half, "malformed request").await;
            }
        };
        info!("Trayecto selected: {trayecto}");

        let file = match trayecto_file(&trayecto) {
            Some(file) => self.trayecto_dir.join(file),
            None => {
                warn!("Unknown trayecto: {trayecto}");
                return send_error(&mut write_half, &format!("Unknown trayecto: {trayecto}")).await;
            }
        };

        let records = match load_trayecto(&file).await {
            Ok(records) => records,
            Err(message) => {
                warn!("{message}");
                return send_error(&mut write_half, &message).await;
            }
        };
        info!("Loaded {} records from {}", records.len(), file.display());

        // The whole trayecto belongs to the vehicle named by the first record.
        let car_id = match records.first().map(|record| record.car_id.clone()) {
            Some(car_id) if !car_id.is_empty() => car_id,
            _ => {
                return send_error(&mut write_half, "no car_id found in the trayecto data").await;
            }
        };

        let _active = match ActiveCarGuard::claim(self.active_cars.clone(), car_id.clone()) {
            Some(guard) => guard,
            None => {
                warn!("Car {car_id} already has an active trayecto");
                return send_error(
                    &mut write_half,
                    &format!("Car {car_id} already has an active trayecto"),
                )
                .await;
            }
        };

        for record in &records {
            send_frame(&mut write_half, &StreamFrame::Record(record.clone())).await?;
            tokio::time::sleep(self.stream_interval).await;
        }

        info!("Trayecto completed for car {car_id}");

        Ok(())
    }
}

fn trayecto_file(trayecto: &str) -> Option<&'static str> {
    match trayecto {
        "Trayecto 1" => Some("trayecto1.json"),
        "Trayecto 2" => Some("trayecto2.json"),
        "Trayecto 3" => Some("trayecto3.json"),
        _ => None,
    }
}

async fn load_trayecto(file: &Path) -> Result<Vec<TelemetryRecord>, String> {
    let contents = tokio::fs::read(file)
        .await
        .map_err(|_| format!("trayecto file not found: {}", file.display()))?;

    let records: Vec<TelemetryRecord> = serde_json::from_slice(&contents)
        .map_err(|_| format!("invalid trayecto file: {}", file.display()))?;

    if records.is_empty() {
        return Err(format!("trayecto file is empty: {}", file.display()));
    }

    Ok(records)
}

async fn send_frame(write_half: &mut (impl AsyncWriteExt + Unpin), frame: &StreamFrame) -> io::Result<()> {
    let mut line = serde_json::to_vec(frame)?;
    line.push(b'\n');
    write_half.write_all(&line).await?;
    write_half.flush().await
}

async fn send_error(write_half: &mut (impl AsyncWriteExt + Unpin), message: &str) -> io::Result<()> {
    send_frame(
        write_half,
        &StreamFrame::Error {
            error: message.to_string(),
        },
    )
    .await
}

/// Marks a vehicle as active for the lifetime of its stream. Dropping the
/// guard releases the vehicle, also when the connection dies mid-stream.
struct ActiveCarGuard {
    active_cars: Arc<Mutex<HashSet<String>>>,
    car_id: String,
}

impl ActiveCarGuard {
    fn claim(active_cars: Arc<Mutex<HashSet<String>>>, car_id: String) -> Option<Self> {
        let claimed = active_cars.lock().unwrap().insert(car_id.clone());

        claimed.then_some(ActiveCarGuard { active_cars, car_id })
    }
}

impl Drop for ActiveCarGuard {
    fn drop(&mut self) {
        self.active_cars.lock().unwrap().remove(&self.car_id);
        info!("Car {} released", self.car_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::first("Trayecto 1", Some("trayecto1.json"))]
    #[case::second("Trayecto 2", Some("trayecto2.json"))]
    #[case::third("Trayecto 3", Some("trayecto3.json"))]
    #[case::unknown("Trayecto 9", None)]
    #[case::empty("", None)]
    fn test_trayecto_file(#[case] trayecto: &str, #[case] expected: Option<&str>) {
        assert_eq!(trayecto_file(trayecto), expected);
    }

    #[test]
    fn test_active_car_guard_releases_on_drop() {
        let active_cars = Arc::new(Mutex::new(HashSet::new()));

        let guard = ActiveCarGuard::claim(active_cars.clone(), "car-1".to_string()).unwrap();
        assert!(ActiveCarGuard::claim(active_cars.clone(), "car-1".to_string()).is_none());

        drop(guard);
        assert!(ActiveCarGuard::claim(active_cars, "car-1".to_string()).is_some());
    }
}
