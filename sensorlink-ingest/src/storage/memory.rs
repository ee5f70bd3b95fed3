use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sensorlink_core::{DeviceId, Reading, ReadingDetail, ReadingId, Sensor, SensorId};
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::storage::{NewReading, NewSensor, SensorStorage, StorageStats};

/// In-memory storage implementation.
/// This is primarily intended for testing and for runs where nothing needs
/// to survive a restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    sensors: HashMap<SensorId, Sensor>,
    by_device: HashMap<DeviceId, SensorId>,
    // insertion order, which is also recording order
    readings: Vec<Reading>,
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryStorageError {
    #[error("device {0:?} already has a sensor")]
    DuplicateDevice(DeviceId),
    #[error("unknown sensor {0:?}")]
    UnknownSensor(SensorId),
}

#[async_trait]
impl SensorStorage for MemoryStorage {
    type Error = MemoryStorageError;

    async fn find_sensor_by_device_id(
        &self,
        device_id: DeviceId,
    ) -> Result<Option<Sensor>, Self::Error> {
        let inner = self.inner.read().await;

        Ok(inner
            .by_device
            .get(&device_id)
            .and_then(|id| inner.sensors.get(id))
            .cloned())
    }

    async fn create_sensor(&self, sensor: NewSensor) -> Result<SensorId, Self::Error> {
        let mut inner = self.inner.write().await;

        if inner.by_device.contains_key(&sensor.device_id) {
            return Err(MemoryStorageError::DuplicateDevice(sensor.device_id));
        }

        let id = SensorId(Ulid::new());
        inner.by_device.insert(sensor.device_id, id);
        inner.sensors.insert(
            id,
            Sensor {
                id,
                device_id: sensor.device_id,
                type_code: sensor.type_code,
                description: sensor.description.into_boxed_str(),
                created_at: jiff::Timestamp::now(),
            },
        );

        Ok(id)
    }

    async fn record_reading(&self, reading: NewReading) -> Result<ReadingId, Self::Error> {
        let mut inner = self.inner.write().await;

        if !inner.sensors.contains_key(&reading.sensor_id) {
            return Err(MemoryStorageError::UnknownSensor(reading.sensor_id));
        }

        let id = ReadingId(Ulid::new());
        inner.readings.push(Reading {
            id,
            sensor_id: reading.sensor_id,
            query: reading.query,
            data: reading.data,
            crc_valid: reading.crc_valid,
            raw_frame: reading.raw_frame.into_boxed_str(),
            recorded_at: jiff::Timestamp::now(),
        });

        Ok(id)
    }

    async fn list_readings(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReadingDetail>, Self::Error> {
        let inner = self.inner.read().await;

        Ok(inner
            .readings
            .iter()
            .filter_map(|r| {
                let sensor = inner.sensors.get(&r.sensor_id)?;
                Some(ReadingDetail {
                    reading_id: r.id,
                    device_id: sensor.device_id,
                    type_code: sensor.type_code,
                    description: sensor.description.clone(),
                    query: r.query,
                    data: r.data,
                    crc_valid: r.crc_valid,
                    raw_frame: r.raw_frame.clone(),
                    recorded_at: r.recorded_at,
                })
            })
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn update_sensor_description(
        &self,
        id: SensorId,
        description: &str,
    ) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write().await;

        let Some(sensor) = inner.sensors.get_mut(&id) else {
            return Ok(false);
        };
        sensor.description = description.into();

        Ok(true)
    }

    async fn delete_reading(&self, id: ReadingId) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write().await;
        let before = inner.readings.len();
        inner.readings.retain(|r| r.id != id);
        Ok(inner.readings.len() != before)
    }

    async fn stats(&self) -> Result<StorageStats, Self::Error> {
        let inner = self.inner.read().await;

        Ok(StorageStats {
            sensors: inner.sensors.len(),
            readings: inner.readings.len(),
            crc_failures: inner.readings.iter().filter(|r| !r.crc_valid).count(),
        })
    }
}
