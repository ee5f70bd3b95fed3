use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use sensorlink_core::{DeviceId, Frame, SENTINEL, SensorKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ByteSource, LinkEvent, LinkId};

/// Query code the simulated devices answer to.
const MOCK_QUERY: u8 = 0x10;

/// Type codes handed out to simulated devices in turn. The last one is not a
/// known sensor type.
const MOCK_TYPE_CODES: [u8; 3] = [
    SensorKind::TEMPERATURE_CODE,
    SensorKind::HUMIDITY_CODE,
    0x09,
];

/// Mock source that produces frames for a set of simulated devices over one
/// link, with optional CRC corruption and line noise.
#[derive(Clone)]
pub struct MockSource {
    frame_interval: Duration,
    devices: Arc<[MockDevice]>,
    corrupt_percent: u32,
    noise_percent: u32,
}

impl MockSource {
    pub fn new(
        frame_interval_ms: u64,
        device_count: u8,
        corrupt_percent: u32,
        noise_percent: u32,
    ) -> Self {
        let devices = (1..=device_count)
            .zip(MOCK_TYPE_CODES.iter().cycle())
            .map(|(id, &type_code)| MockDevice {
                device_id: DeviceId(id),
                type_code,
            })
            .collect();

        Self {
            frame_interval: Duration::from_millis(frame_interval_ms.max(1)),
            devices,
            corrupt_percent: corrupt_percent.min(100),
            noise_percent: noise_percent.min(100),
        }
    }

    /// Bytes for one round: a frame per device, possibly damaged.
    fn generate_chunk(&self) -> Vec<u8> {
        let mut rng = rand::rng();
        let mut bytes = Vec::with_capacity(self.devices.len() * 12);

        for device in self.devices.iter() {
            if rng.random_ratio(self.noise_percent, 100) {
                let noise_len = rng.random_range(1..4usize);
                bytes.extend((0..noise_len).map(|_| noise_byte(&mut rng)));
            }

            let mut frame = device.generate_frame(&mut rng).into_bytes();
            if rng.random_ratio(self.corrupt_percent, 100) {
                frame[6] ^= 1u8 << rng.random_range(0..8u32);
            }
            bytes.extend_from_slice(&frame);
        }

        bytes
    }
}

/// Any byte except the sentinel, so noise never opens a frame.
fn noise_byte(rng: &mut impl Rng) -> u8 {
    loop {
        let b: u8 = rng.random();
        if b != SENTINEL {
            return b;
        }
    }
}

/// A simulated device with a stable id and type.
struct MockDevice {
    device_id: DeviceId,
    type_code: u8,
}

impl MockDevice {
    fn generate_frame(&self, rng: &mut impl Rng) -> Frame {
        let data = match SensorKind::from_code(self.type_code) {
            SensorKind::Temperature => rng.random_range(15..35),
            SensorKind::Humidity => rng.random_range(30..90),
            SensorKind::Unknown => rng.random(),
        };

        Frame::encode(self.type_code, self.device_id, MOCK_QUERY, data)
    }
}

#[async_trait]
impl ByteSource for MockSource {
    type Error = std::convert::Infallible;

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<LinkEvent>, Self::Error> {
        let (tx, rx) = mpsc::channel(100);

        let link = LinkId::new();
        let source = self.clone();
        let frame_interval = source.frame_interval;

        info!(
            device_count = source.devices.len(),
            frame_interval_ms = frame_interval.as_millis() as u64,
            corrupt_percent = source.corrupt_percent,
            noise_percent = source.noise_percent,
            "Starting mock source"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame_interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Mock source shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let bytes = source.generate_chunk().into_boxed_slice();
                        if tx.send(LinkEvent::Data { link, bytes }).await.is_err() {
                            info!("Channel closed, mock source shutting down");
                            return;
                        }
                    }
                }
            }

            let _ = tx.send(LinkEvent::Closed { link }).await;
        });

        Ok(rx)
    }
}
