pub mod memory;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;
use sensorlink_core::{DeviceId, ReadingDetail, ReadingId, Sensor, SensorId};

pub use models::{NewReading, NewSensor, StorageStats};

/// Persistence collaborator for decoded readings.
///
/// The ingest pipeline only needs the first three operations. The rest are
/// administrative queries used by the HTTP API.
#[async_trait]
pub trait SensorStorage: Send + Sync + 'static {
    /// Error type specific to this storage implementation
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up the sensor registered for a wire device id.
    async fn find_sensor_by_device_id(
        &self,
        device_id: DeviceId,
    ) -> Result<Option<Sensor>, Self::Error>;

    /// Register a sensor. Fails if the device id already has one.
    async fn create_sensor(&self, sensor: NewSensor) -> Result<SensorId, Self::Error>;

    /// Record a reading for an existing sensor.
    async fn record_reading(&self, reading: NewReading) -> Result<ReadingId, Self::Error>;

    /// One page of readings joined with their sensor, in recording order.
    /// `offset` counts readings to skip from the oldest.
    async fn list_readings(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReadingDetail>, Self::Error>;

    /// Returns `false` if no sensor has this id.
    async fn update_sensor_description(
        &self,
        id: SensorId,
        description: &str,
    ) -> Result<bool, Self::Error>;

    /// Returns `false` if no reading has this id.
    async fn delete_reading(&self, id: ReadingId) -> Result<bool, Self::Error>;

    /// Get statistics about stored data.
    async fn stats(&self) -> Result<StorageStats, Self::Error>;
}
