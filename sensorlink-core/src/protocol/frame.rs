use super::{
    CRC_HI_OFFSET, CRC_LO_OFFSET, DATA_OFFSET, DEVICE_OFFSET, END_OFFSET, FRAME_LEN,
    QUERY_OFFSET, SENTINEL, TYPE_OFFSET, crc::crc16_ccitt_false, error::FrameError,
};
use crate::DeviceId;

// frame structure: sentinel(1) + type(1) + device(1) + query(1) + data(1) + crc(2) + sentinel(1)

/// A structurally valid frame: 8 bytes, first and last both [`SENTINEL`].
///
/// Nothing is said about the CRC; that is checked when the frame is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Build a frame carrying a correct CRC over the four payload bytes.
    pub fn encode(sensor_type: u8, device_id: DeviceId, query: u8, data: u8) -> Self {
        let mut bytes = [0u8; FRAME_LEN];

        bytes[0] = SENTINEL;
        bytes[TYPE_OFFSET] = sensor_type;
        bytes[DEVICE_OFFSET] = device_id.0;
        bytes[QUERY_OFFSET] = query;
        bytes[DATA_OFFSET] = data;

        let crc = crc16_ccitt_false(&bytes[TYPE_OFFSET..CRC_HI_OFFSET]).to_be_bytes();
        bytes[CRC_HI_OFFSET] = crc[0];
        bytes[CRC_LO_OFFSET] = crc[1];
        bytes[END_OFFSET] = SENTINEL;

        Self(bytes)
    }

    pub fn sensor_type(&self) -> u8 {
        self.0[TYPE_OFFSET]
    }

    pub fn device_id(&self) -> DeviceId {
        DeviceId(self.0[DEVICE_OFFSET])
    }

    pub fn query(&self) -> u8 {
        self.0[QUERY_OFFSET]
    }

    pub fn data(&self) -> u8 {
        self.0[DATA_OFFSET]
    }

    /// The CRC the sender put on the wire, big-endian.
    pub fn asserted_crc(&self) -> u16 {
        u16::from_be_bytes([self.0[CRC_HI_OFFSET], self.0[CRC_LO_OFFSET]])
    }

    /// The bytes covered by the CRC: type, device, query and data.
    pub fn payload(&self) -> &[u8] {
        &self.0[TYPE_OFFSET..CRC_HI_OFFSET]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; FRAME_LEN] {
        self.0
    }

    /// Uppercase two digit hex, space separated, in wire order.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl core::fmt::Display for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl TryFrom<[u8; FRAME_LEN]> for Frame {
    type Error = FrameError;

    fn try_from(bytes: [u8; FRAME_LEN]) -> Result<Self, Self::Error> {
        for offset in [0, END_OFFSET] {
            if bytes[offset] != SENTINEL {
                return Err(FrameError::MissingSentinel {
                    offset,
                    found: bytes[offset],
                });
            }
        }

        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = FrameError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; FRAME_LEN] =
            bytes.try_into().map_err(|_| FrameError::InvalidLength {
                expected: FRAME_LEN,
                actual: bytes.len(),
            })?;

        Self::try_from(bytes)
    }
}

/// Outcome of feeding one byte to a [`FrameAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    /// The byte was buffered; the frame is not finished yet.
    Incomplete,
    /// The byte finished a well delimited frame.
    Complete(Frame),
    /// The byte broke framing. The attempt was dropped and the next byte
    /// starts a new one.
    Discarded,
}

/// Byte-at-a-time frame synchronizer.
///
/// Only byte 0 and byte 7 are checked against the sentinel. Bytes 1 to 6 are
/// opaque, so a `0x7E` in the middle of a frame is payload, not a terminator.
/// Malformed input is never an error: the attempt is dropped and the
/// assembler resynchronizes on the following byte.
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler {
    buf: [u8; FRAME_LEN],
    len: usize,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; FRAME_LEN],
            len: 0,
        }
    }

    pub fn feed_byte(&mut self, byte: u8) -> FrameResult {
        if self.len == 0 {
            if byte != SENTINEL {
                return FrameResult::Discarded;
            }
            self.buf[0] = byte;
            self.len = 1;
            return FrameResult::Incomplete;
        }

        self.buf[self.len] = byte;
        self.len += 1;

        if self.len < FRAME_LEN {
            return FrameResult::Incomplete;
        }

        self.len = 0;
        if byte == SENTINEL {
            FrameResult::Complete(Frame(self.buf))
        } else {
            FrameResult::Discarded
        }
    }

    /// Abandon any partially collected frame.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Whether a frame attempt is in progress.
    pub fn is_collecting(&self) -> bool {
        self.len > 0
    }

    /// Number of bytes buffered for the current attempt.
    pub fn buffered(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: [u8; FRAME_LEN] = [0x7E, 0x01, 0x05, 0x10, 0x20, 0x3E, 0x95, 0x7E];

    fn feed_all(assembler: &mut FrameAssembler, bytes: &[u8]) -> Vec<FrameResult> {
        bytes.iter().map(|&b| assembler.feed_byte(b)).collect()
    }

    fn completed(results: &[FrameResult]) -> Vec<Frame> {
        results
            .iter()
            .filter_map(|r| match r {
                FrameResult::Complete(frame) => Some(*frame),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn encode_matches_reference_frame() {
        let frame = Frame::encode(0x01, DeviceId(5), 0x10, 0x20);
        assert_eq!(frame.into_bytes(), GOOD);
        assert_eq!(frame.asserted_crc(), 0x3E95);
    }

    #[test]
    fn accessors() {
        let frame = Frame::try_from(GOOD).unwrap();
        assert_eq!(frame.sensor_type(), 0x01);
        assert_eq!(frame.device_id(), DeviceId(5));
        assert_eq!(frame.query(), 0x10);
        assert_eq!(frame.data(), 0x20);
        assert_eq!(frame.payload(), &[0x01, 0x05, 0x10, 0x20]);
    }

    #[test]
    fn hex_rendering() {
        let frame = Frame::try_from(GOOD).unwrap();
        assert_eq!(frame.to_hex(), "7E 01 05 10 20 3E 95 7E");
    }

    #[test]
    fn try_from_rejects_missing_sentinels() {
        let mut bytes = GOOD;
        bytes[0] = 0x00;
        assert_eq!(
            Frame::try_from(bytes),
            Err(FrameError::MissingSentinel {
                offset: 0,
                found: 0x00
            })
        );

        let mut bytes = GOOD;
        bytes[7] = 0x7F;
        assert_eq!(
            Frame::try_from(bytes),
            Err(FrameError::MissingSentinel {
                offset: 7,
                found: 0x7F
            })
        );
    }

    #[test]
    fn try_from_slice_checks_length() {
        assert_eq!(
            Frame::try_from(&GOOD[..7]),
            Err(FrameError::InvalidLength {
                expected: FRAME_LEN,
                actual: 7
            })
        );
        assert!(Frame::try_from(&GOOD[..]).is_ok());
    }

    #[test]
    fn assembles_single_frame() {
        let mut assembler = FrameAssembler::new();
        let results = feed_all(&mut assembler, &GOOD);

        assert!(results[..7].iter().all(|r| *r == FrameResult::Incomplete));
        assert_eq!(results[7], FrameResult::Complete(Frame(GOOD)));
        assert!(!assembler.is_collecting());
    }

    #[test]
    fn leading_non_sentinel_is_discarded_without_buffering() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.feed_byte(0x01), FrameResult::Discarded);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn bad_end_sentinel_discards() {
        let mut bytes = GOOD;
        bytes[7] = 0x00;

        let mut assembler = FrameAssembler::new();
        let results = feed_all(&mut assembler, &bytes);

        assert_eq!(results[7], FrameResult::Discarded);
        assert!(completed(&results).is_empty());
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn interior_sentinels_are_payload() {
        let bytes = [0x7E, 0x7E, 0x7E, 0x7E, 0x7E, 0x7E, 0x7E, 0x7E];

        let mut assembler = FrameAssembler::new();
        let results = feed_all(&mut assembler, &bytes);

        assert_eq!(completed(&results), vec![Frame(bytes)]);
    }

    #[test]
    fn resynchronizes_after_garbage() {
        let mut stream = vec![0x01, 0x02, 0x03, 0xFF, 0x00];
        stream.extend_from_slice(&GOOD);

        let mut assembler = FrameAssembler::new();
        let results = feed_all(&mut assembler, &stream);

        assert_eq!(completed(&results), vec![Frame(GOOD)]);
    }

    #[test]
    fn resynchronizes_after_broken_frame() {
        // starts like a frame but the eighth byte is wrong
        let mut stream = vec![0x7E, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        stream.extend_from_slice(&GOOD);
        stream.extend_from_slice(&GOOD);

        let mut assembler = FrameAssembler::new();
        let results = feed_all(&mut assembler, &stream);

        assert_eq!(results[7], FrameResult::Discarded);
        assert_eq!(completed(&results), vec![Frame(GOOD), Frame(GOOD)]);
    }

    #[test]
    fn never_completes_without_both_sentinels() {
        let mut assembler = FrameAssembler::new();
        for first in [0x00u8, 0x7E, 0xFF] {
            for last in [0x00u8, 0x7E, 0xFF] {
                let bytes = [first, 1, 2, 3, 4, 5, 6, last];
                for r in feed_all(&mut assembler, &bytes) {
                    if let FrameResult::Complete(frame) = r {
                        assert_eq!(frame.as_bytes()[0], SENTINEL);
                        assert_eq!(frame.as_bytes()[7], SENTINEL);
                    }
                }
                assembler.reset();
            }
        }
    }

    #[test]
    fn malformed_stream_produces_nothing() {
        let mut assembler = FrameAssembler::new();
        let results = feed_all(&mut assembler, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        assert!(results.iter().all(|r| *r == FrameResult::Discarded));
    }

    #[test]
    fn reset_abandons_partial_frame() {
        let mut assembler = FrameAssembler::new();
        feed_all(&mut assembler, &GOOD[..4]);
        assert!(assembler.is_collecting());

        assembler.reset();
        assert!(!assembler.is_collecting());

        let results = feed_all(&mut assembler, &GOOD);
        assert_eq!(completed(&results), vec![Frame(GOOD)]);
    }
}
