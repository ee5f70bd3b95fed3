//! CRC-16/CCITT-FALSE: init `0xFFFF`, poly `0x1021`, MSB first, no reflection,
//! no final XOR.

const INIT: u16 = 0xFFFF;
const POLY: u16 = 0x1021;

pub fn crc16_ccitt_false(bytes: &[u8]) -> u16 {
    let mut crc = INIT;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
