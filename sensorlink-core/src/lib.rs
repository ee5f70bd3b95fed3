pub mod protocol;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub use protocol::{
    FRAME_LEN, SENTINEL,
    crc::crc16_ccitt_false,
    decode::{DecodedReading, decode},
    error::FrameError,
    frame::{Frame, FrameAssembler, FrameResult},
    sensor::SensorKind,
};

// We use `Box<str>` for strings that are never resized after construction.
// This keeps records compact and avoids accidental cloning of large values.
type BoxStr = Box<str>;

/// Identifier a physical sensor unit reports on the wire (frame offset 2).
///
/// This is distinct from the persisted identity of its [`Sensor`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub u8);

/// Persisted identity of a sensor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorId(pub Ulid);

/// Persisted identity of a reading record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadingId(pub Ulid);

/// A sensor known to the persistence layer.
///
/// At most one record exists per [`DeviceId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Stable identity of this sensor.
    pub id: SensorId,
    /// Wire device id the sensor reports with.
    pub device_id: DeviceId,
    /// Raw type code taken from the first frame seen for this device.
    pub type_code: u8,
    /// Human readable description.
    pub description: BoxStr,
    /// When the sensor was first seen.
    pub created_at: jiff::Timestamp,
}

impl Sensor {
    pub fn kind(&self) -> SensorKind {
        SensorKind::from_code(self.type_code)
    }
}

/// One decoded observation tied to a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique id for this reading.
    pub id: ReadingId,
    /// Sensor that produced this reading.
    pub sensor_id: SensorId,
    /// Query/command code, persisted verbatim.
    pub query: u8,
    /// Data value carried by the frame.
    pub data: u8,
    /// Whether the asserted CRC matched the computed one.
    pub crc_valid: bool,
    /// The full frame as space separated uppercase hex.
    pub raw_frame: BoxStr,
    /// When the reading was recorded.
    pub recorded_at: jiff::Timestamp,
}

/// A reading joined with the sensor that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingDetail {
    pub reading_id: ReadingId,
    pub device_id: DeviceId,
    pub type_code: u8,
    pub description: BoxStr,
    pub query: u8,
    pub data: u8,
    pub crc_valid: bool,
    pub raw_frame: BoxStr,
    pub recorded_at: jiff::Timestamp,
}
