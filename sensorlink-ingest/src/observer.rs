use std::sync::Arc;

use sensorlink_core::{DecodedReading, DeviceId};
use serde::Serialize;
use tracing::{info, warn};

/// What an operator sees for every recorded reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingEvent {
    pub device_id: DeviceId,
    pub type_label: &'static str,
    pub data: u8,
    pub crc_valid: bool,
}

impl From<&DecodedReading> for ReadingEvent {
    fn from(reading: &DecodedReading) -> Self {
        Self {
            device_id: reading.device_id,
            type_label: reading.type_label(),
            data: reading.data,
            crc_valid: reading.crc_valid,
        }
    }
}

/// Sink for [`ReadingEvent`]s.
pub trait ReadingObserver: Send + Sync + 'static {
    fn observe(&self, event: &ReadingEvent);
}

impl<T: ReadingObserver + ?Sized> ReadingObserver for Arc<T> {
    fn observe(&self, event: &ReadingEvent) {
        (**self).observe(event)
    }
}

/// Reports readings through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ReadingObserver for TracingObserver {
    fn observe(&self, event: &ReadingEvent) {
        if event.crc_valid {
            info!(
                device_id = event.device_id.0,
                sensor = event.type_label,
                value = event.data,
                crc_valid = event.crc_valid,
                "Reading recorded"
            );
        } else {
            warn!(
                device_id = event.device_id.0,
                sensor = event.type_label,
                value = event.data,
                crc_valid = event.crc_valid,
                "Reading recorded with CRC mismatch"
            );
        }
    }
}
