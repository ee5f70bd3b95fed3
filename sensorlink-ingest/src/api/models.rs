use axum::Json;
use sensorlink_core::{ReadingDetail, Sensor, SensorKind};
use serde::{Deserialize, Serialize};

use crate::storage::StorageStats;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQueryParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SensorUpdateRequest {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SensorResponse {
    pub id: String,
    pub device_id: u8,
    pub type_code: u8,
    pub kind: SensorKind,
    pub description: String,
    pub created_at: String,
}

impl From<Sensor> for SensorResponse {
    fn from(sensor: Sensor) -> Self {
        Self {
            id: sensor.id.0.to_string(),
            device_id: sensor.device_id.0,
            type_code: sensor.type_code,
            kind: sensor.kind(),
            description: sensor.description.into_string(),
            created_at: sensor.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingResponse {
    pub id: String,
    pub device_id: u8,
    pub type_code: u8,
    pub kind: SensorKind,
    pub description: String,
    pub query: u8,
    pub data: u8,
    pub crc_valid: bool,
    pub raw_frame: String,
    pub recorded_at: String,
}

impl From<ReadingDetail> for ReadingResponse {
    fn from(detail: ReadingDetail) -> Self {
        Self {
            id: detail.reading_id.0.to_string(),
            device_id: detail.device_id.0,
            type_code: detail.type_code,
            kind: SensorKind::from_code(detail.type_code),
            description: detail.description.into_string(),
            query: detail.query,
            data: detail.data,
            crc_valid: detail.crc_valid,
            raw_frame: detail.raw_frame.into_string(),
            recorded_at: detail.recorded_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub sensors: usize,
    pub readings: usize,
    pub crc_failures: usize,
    /// Fraction of readings whose CRC did not match, 0 when there are none.
    pub crc_failure_rate: f64,
}

impl From<StorageStats> for StatsResponse {
    fn from(stats: StorageStats) -> Self {
        let crc_failure_rate = if stats.readings == 0 {
            0.0
        } else {
            stats.crc_failures as f64 / stats.readings as f64
        };

        Self {
            sensors: stats.sensors,
            readings: stats.readings,
            crc_failures: stats.crc_failures,
            crc_failure_rate,
        }
    }
}
