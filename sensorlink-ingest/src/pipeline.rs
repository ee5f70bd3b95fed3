use sensorlink_core::{DeviceId, FrameAssembler, FrameResult, decode};
use tracing::{info, trace};

use crate::observer::{ReadingEvent, ReadingObserver, TracingObserver};
use crate::storage::{NewReading, NewSensor, SensorStorage};

/// Result of pushing one byte through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// Buffered, the frame is not finished yet.
    Pending,
    /// Dropped by the frame synchronizer.
    Discarded,
    /// A frame completed and its reading was persisted.
    Recorded(ReadingEvent),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to look up sensor for device {}", .device_id.0)]
    Lookup { device_id: DeviceId, source: E },

    #[error("failed to register sensor for device {}", .device_id.0)]
    CreateSensor { device_id: DeviceId, source: E },

    #[error("failed to record reading for device {}", .device_id.0)]
    RecordReading { device_id: DeviceId, source: E },
}

/// Counters for a single link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub bytes: u64,
    pub frames: u64,
    pub discarded: u64,
    pub crc_failures: u64,
}

/// Drives bytes from one link through framing, decoding and persistence.
///
/// Each pipeline owns its frame buffer, so concurrent links need one
/// pipeline each. Every call finishes its storage round trip before it
/// returns, which makes a slow store hold back the byte source.
pub struct IngestPipeline<S, O = TracingObserver> {
    assembler: FrameAssembler,
    storage: S,
    observer: O,
    stats: LinkStats,
}

impl<S: SensorStorage> IngestPipeline<S> {
    pub fn new(storage: S) -> Self {
        Self::with_observer(storage, TracingObserver)
    }
}

impl<S, O> IngestPipeline<S, O>
where
    S: SensorStorage,
    O: ReadingObserver,
{
    pub fn with_observer(storage: S, observer: O) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            storage,
            observer,
            stats: LinkStats::default(),
        }
    }

    pub async fn on_byte(&mut self, byte: u8) -> Result<Ingested, IngestError<S::Error>> {
        self.stats.bytes += 1;

        let frame = match self.assembler.feed_byte(byte) {
            FrameResult::Incomplete => return Ok(Ingested::Pending),
            FrameResult::Discarded => {
                self.stats.discarded += 1;
                trace!(byte, "Discarded out-of-frame byte");
                return Ok(Ingested::Discarded);
            }
            FrameResult::Complete(frame) => frame,
        };

        self.stats.frames += 1;
        let reading = decode(&frame);
        if !reading.crc_valid {
            self.stats.crc_failures += 1;
        }

        let device_id = reading.device_id;
        let existing = self
            .storage
            .find_sensor_by_device_id(device_id)
            .await
            .map_err(|source| IngestError::Lookup { device_id, source })?;

        let sensor_id = match existing {
            Some(sensor) => sensor.id,
            None => {
                let id = self
                    .storage
                    .create_sensor(NewSensor::from(&reading))
                    .await
                    .map_err(|source| IngestError::CreateSensor { device_id, source })?;
                info!(
                    device_id = device_id.0,
                    sensor = reading.type_label(),
                    sensor_id = %id.0,
                    "Registered new sensor"
                );
                id
            }
        };

        let event = ReadingEvent::from(&reading);
        self.storage
            .record_reading(NewReading::from_decoded(sensor_id, reading))
            .await
            .map_err(|source| IngestError::RecordReading { device_id, source })?;

        self.observer.observe(&event);
        Ok(Ingested::Recorded(event))
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
