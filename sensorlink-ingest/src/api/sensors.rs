use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
};
use sensorlink_core::{DeviceId, SensorId};
use ulid::Ulid;

use super::AppState;
use super::error::ApiError;
use super::models::{ApiResponse, SensorResponse, SensorUpdateRequest};
use crate::storage::SensorStorage;

pub async fn get_sensor_by_device<S>(
    Path(device_id): Path<u8>,
    State(state): State<AppState<S>>,
) -> Result<Json<ApiResponse<SensorResponse>>, ApiError>
where
    S: SensorStorage + Clone,
{
    let sensor = state
        .storage
        .find_sensor_by_device_id(DeviceId(device_id))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Failed to look up sensor: {e}")))?
        .ok_or_else(|| ApiError::NotFound(format!("No sensor for device {device_id}")))?;

    Ok(ApiResponse::ok(SensorResponse::from(sensor)))
}

pub async fn update_sensor<S>(
    Path(id): Path<String>,
    State(state): State<AppState<S>>,
    Json(request): Json<SensorUpdateRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError>
where
    S: SensorStorage + Clone,
{
    let id = Ulid::from_str(&id)
        .map(SensorId)
        .map_err(|_| ApiError::BadRequest("Invalid sensor ID format. Expected ULID.".into()))?;

    let description = request.description.trim();
    if description.is_empty() {
        return Err(ApiError::BadRequest("description must not be empty".into()));
    }

    let updated = state
        .storage
        .update_sensor_description(id, description)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Failed to update sensor: {e}")))?;

    if !updated {
        return Err(ApiError::NotFound(format!("Sensor {} not found", id.0)));
    }

    tracing::info!(sensor_id = %id.0, description, "Sensor description updated");
    Ok(ApiResponse::ok(id.0.to_string()))
}
