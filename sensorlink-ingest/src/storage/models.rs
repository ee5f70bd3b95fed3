use sensorlink_core::{DecodedReading, DeviceId, SensorId};
use serde::Serialize;

/// sensor to register, the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSensor {
    pub device_id: DeviceId,
    pub type_code: u8,
    pub description: String,
}

impl From<&DecodedReading> for NewSensor {
    fn from(reading: &DecodedReading) -> Self {
        Self {
            device_id: reading.device_id,
            type_code: reading.type_code,
            description: reading.kind.description(),
        }
    }
}

/// reading to record, the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReading {
    pub sensor_id: SensorId,
    pub query: u8,
    pub data: u8,
    pub crc_valid: bool,
    pub raw_frame: String,
}

impl NewReading {
    pub fn from_decoded(sensor_id: SensorId, reading: DecodedReading) -> Self {
        Self {
            sensor_id,
            query: reading.query,
            data: reading.data,
            crc_valid: reading.crc_valid,
            raw_frame: reading.raw_frame,
        }
    }
}

/// Statistics about stored data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of registered sensors.
    pub sensors: usize,
    /// Total number of readings.
    pub readings: usize,
    /// Readings whose CRC did not match.
    pub crc_failures: usize,
}
