pub mod error;
pub mod models;
pub mod readings;
pub mod sensors;

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, put},
};

use crate::storage::SensorStorage;
use error::ApiError;
use models::{ApiResponse, StatsResponse};

#[derive(Clone)]
pub struct AppState<S> {
    pub storage: S,
}

pub fn router<S>(storage: S) -> Router
where
    S: SensorStorage + Clone,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/stats", get(stats::<S>))
        .route("/api/readings", get(readings::list_readings::<S>))
        .route("/api/readings/{id}", delete(readings::delete_reading::<S>))
        .route(
            "/api/devices/{device_id}/sensor",
            get(sensors::get_sensor_by_device::<S>),
        )
        .route("/api/sensors/{id}", put(sensors::update_sensor::<S>))
        .with_state(AppState { storage })
}

async fn health_handler() -> &'static str {
    "OK"
}

pub async fn stats<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError>
where
    S: SensorStorage + Clone,
{
    let stats = state
        .storage
        .stats()
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Failed to read stats: {e}")))?;

    Ok(ApiResponse::ok(StatsResponse::from(stats)))
}

#[cfg(test)]
mod tests {
    use sensorlink_core::{DeviceId, Frame};
    use serde_json::Value;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::pipeline::IngestPipeline;
    use crate::storage::memory::MemoryStorage;

    async fn serve(storage: MemoryStorage) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(storage)).await.unwrap();
        });
        addr
    }

    /// Sends one HTTP/1.1 request and returns the status code and body.
    async fn request(addr: std::net::SocketAddr, method: &str, path: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let head = format!(
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(head.as_bytes()).await.unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let status = head.split(' ').nth(1).unwrap().parse().unwrap();
        (status, body.to_owned())
    }

    async fn seeded() -> MemoryStorage {
        let storage = MemoryStorage::default();
        let mut pipeline = IngestPipeline::new(storage.clone());

        let good = Frame::encode(0x01, DeviceId(5), 0x10, 0x20).into_bytes();
        let mut bad = Frame::encode(0x02, DeviceId(6), 0x10, 0x30).into_bytes();
        bad[6] ^= 0x01;
        for b in good.into_iter().chain(bad) {
            pipeline.on_byte(b).await.unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn health() {
        let addr = serve(MemoryStorage::default()).await;
        let (status, body) = request(addr, "GET", "/health").await;
        assert_eq!(status, 200);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn stats_envelope_reports_failure_rate() {
        let addr = serve(seeded().await).await;

        let (status, body) = request(addr, "GET", "/api/stats").await;
        assert_eq!(status, 200);

        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["sensors"], 2);
        assert_eq!(body["data"]["readings"], 2);
        assert_eq!(body["data"]["crc_failures"], 1);
        assert_eq!(body["data"]["crc_failure_rate"], 0.5);
    }

    #[tokio::test]
    async fn sensor_route_takes_device_id() {
        let addr = serve(seeded().await).await;

        let (status, body) = request(addr, "GET", "/api/devices/5/sensor").await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["data"]["device_id"], 5);
        assert_eq!(body["data"]["kind"], "temperature");

        let (status, _) = request(addr, "GET", "/api/devices/9/sensor").await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn readings_route_pages() {
        let addr = serve(seeded().await).await;

        let (status, body) = request(addr, "GET", "/api/readings?offset=1&limit=5").await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_str(&body).unwrap();
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["device_id"], 6);
        assert_eq!(data[0]["crc_valid"], false);
    }

    #[tokio::test]
    async fn delete_rejects_malformed_id() {
        let addr = serve(seeded().await).await;

        let (status, body) = request(addr, "DELETE", "/api/readings/not-a-ulid").await;
        assert_eq!(status, 400);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["success"], false);

        let missing = format!("/api/readings/{}", ulid::Ulid::new());
        let (status, _) = request(addr, "DELETE", &missing).await;
        assert_eq!(status, 404);
    }
}
