pub mod crc;
pub mod decode;
pub mod error;
pub mod frame;
pub mod sensor;

/// Byte marking both the start and the end of a frame.
pub const SENTINEL: u8 = 0x7E;
/// Every frame is exactly this many bytes, sentinels included.
pub const FRAME_LEN: usize = 8;

// frame layout: sentinel(1) + type(1) + device(1) + query(1) + data(1) + crc(2) + sentinel(1)
pub(crate) const TYPE_OFFSET: usize = 1;
pub(crate) const DEVICE_OFFSET: usize = 2;
pub(crate) const QUERY_OFFSET: usize = 3;
pub(crate) const DATA_OFFSET: usize = 4;
pub(crate) const CRC_HI_OFFSET: usize = 5;
pub(crate) const CRC_LO_OFFSET: usize = 6;
pub(crate) const END_OFFSET: usize = FRAME_LEN - 1;
