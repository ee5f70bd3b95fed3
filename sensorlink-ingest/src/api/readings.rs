use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use sensorlink_core::ReadingId;
use ulid::Ulid;

use super::AppState;
use super::error::ApiError;
use super::models::{ApiResponse, ListQueryParams, ReadingResponse};
use crate::storage::SensorStorage;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 1000;

// A page of readings joined with their sensor, oldest first. Page forward
// with `offset` to reach newer ones.
pub async fn list_readings<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<ApiResponse<Vec<ReadingResponse>>>, ApiError>
where
    S: SensorStorage + Clone,
{
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let readings = state
        .storage
        .list_readings(offset, limit)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Failed to list readings: {e}")))?;

    Ok(ApiResponse::ok(
        readings.into_iter().map(ReadingResponse::from).collect(),
    ))
}

pub async fn delete_reading<S>(
    Path(id): Path<String>,
    State(state): State<AppState<S>>,
) -> Result<Json<ApiResponse<String>>, ApiError>
where
    S: SensorStorage + Clone,
{
    let id = Ulid::from_str(&id)
        .map(ReadingId)
        .map_err(|_| ApiError::BadRequest("Invalid reading ID format. Expected ULID.".into()))?;

    let deleted = state
        .storage
        .delete_reading(id)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Failed to delete reading: {e}")))?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Reading {} not found", id.0)));
    }

    tracing::info!(reading_id = %id.0, "Reading deleted");
    Ok(ApiResponse::ok(id.0.to_string()))
}

#[cfg(test)]
mod tests {
    use sensorlink_core::{DeviceId, Frame};

    use super::*;
    use crate::pipeline::IngestPipeline;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{NewReading, NewSensor};

    async fn seeded() -> AppState<MemoryStorage> {
        let storage = MemoryStorage::default();
        let mut pipeline = IngestPipeline::new(storage.clone());
        for data in [10, 20, 30] {
            for b in Frame::encode(0x01, DeviceId(5), 0x10, data).into_bytes() {
                pipeline.on_byte(b).await.unwrap();
            }
        }
        AppState { storage }
    }

    #[tokio::test]
    async fn lists_oldest_first_with_limit() {
        let state = seeded().await;

        let Json(response) = list_readings(
            State(state),
            Query(ListQueryParams {
                offset: None,
                limit: Some(2),
            }),
        )
        .await
        .unwrap();

        let data = response.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].data, 10);
        assert_eq!(data[1].data, 20);
        assert_eq!(data[0].description, "temperature sensor");
    }

    #[tokio::test]
    async fn offset_reaches_newest_reading() {
        let storage = MemoryStorage::default();
        let sensor_id = storage
            .create_sensor(NewSensor {
                device_id: DeviceId(1),
                type_code: 0x01,
                description: "temperature sensor".into(),
            })
            .await
            .unwrap();

        let mut newest = None;
        for i in 0..=MAX_LIMIT {
            let id = storage
                .record_reading(NewReading {
                    sensor_id,
                    query: 0x10,
                    data: (i % 256) as u8,
                    crc_valid: true,
                    raw_frame: String::new(),
                })
                .await
                .unwrap();
            newest = Some(id);
        }

        let Json(response) = list_readings(
            State(AppState { storage }),
            Query(ListQueryParams {
                offset: Some(MAX_LIMIT - 1),
                limit: Some(10),
            }),
        )
        .await
        .unwrap();

        let data = response.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].id, newest.unwrap().0.to_string());
        assert_eq!(data[1].data, (MAX_LIMIT % 256) as u8);
    }

    #[tokio::test]
    async fn rejects_zero_limit() {
        let state = seeded().await;
        let result = list_readings(
            State(state),
            Query(ListQueryParams {
                offset: None,
                limit: Some(0),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn deletes_reading_once() {
        let state = seeded().await;
        let readings = state.storage.list_readings(0, 10).await.unwrap();
        let id = readings[0].reading_id.0.to_string();

        delete_reading(Path(id.clone()), State(state.clone()))
            .await
            .unwrap();
        let again = delete_reading(Path(id), State(state.clone())).await;
        assert!(matches!(again, Err(ApiError::NotFound(_))));

        assert_eq!(state.storage.stats().await.unwrap().readings, 2);
    }

    #[tokio::test]
    async fn delete_rejects_malformed_id() {
        let state = seeded().await;
        let result = delete_reading(Path("not-a-ulid".into()), State(state)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
