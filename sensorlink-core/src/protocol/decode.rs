use serde::{Deserialize, Serialize};

use super::{crc::crc16_ccitt_false, frame::Frame, sensor::SensorKind};
use crate::DeviceId;

/// Typed view of a frame, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedReading {
    pub device_id: DeviceId,
    pub type_code: u8,
    pub kind: SensorKind,
    pub query: u8,
    pub data: u8,
    /// `false` when the asserted CRC disagrees with the payload.
    pub crc_valid: bool,
    pub raw_frame: String,
}

impl DecodedReading {
    pub fn type_label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Decode a complete frame.
///
/// Never fails: a CRC mismatch is reported through `crc_valid` and every
/// other field is taken from the frame as asserted.
pub fn decode(frame: &Frame) -> DecodedReading {
    let type_code = frame.sensor_type();
    let crc_valid = frame.asserted_crc() == crc16_ccitt_false(frame.payload());

    DecodedReading {
        device_id: frame.device_id(),
        type_code,
        kind: SensorKind::from_code(type_code),
        query: frame.query(),
        data: frame.data(),
        crc_valid,
        raw_frame: frame.to_hex(),
    }
}
