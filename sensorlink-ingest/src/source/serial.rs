use std::io::{ErrorKind, Read};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{ByteSource, LinkEvent, LinkId};

/// How long a blocking read waits before checking for cancellation.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Reads a serial device as a single link.
pub struct SerialSource {
    path: String,
    baud_rate: u32,
}

impl SerialSource {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

#[async_trait]
impl ByteSource for SerialSource {
    type Error = serialport::Error;

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<LinkEvent>, Self::Error> {
        let (tx, rx) = mpsc::channel(100);

        let builder = serialport::new(self.path.clone(), self.baud_rate)
            .timeout(READ_TIMEOUT)
            .flow_control(serialport::FlowControl::None);

        // opening a tty can block, keep it off the async workers
        let mut port = tokio::task::spawn_blocking(move || builder.open())
            .await
            .map_err(|e| serialport::Error::new(serialport::ErrorKind::Unknown, e.to_string()))??;

        let link = LinkId::new();
        info!(path = %self.path, baud_rate = self.baud_rate, link = %link.0, "Serial source started");

        tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; 256];

            while !cancel.is_cancelled() {
                match port.read(&mut buf) {
                    Ok(0) => continue,
                    Ok(n) => {
                        let bytes = buf[..n].into();
                        if tx.blocking_send(LinkEvent::Data { link, bytes }).is_err() {
                            info!("Channel closed, serial source shutting down");
                            return;
                        }
                    }
                    Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                        continue;
                    }
                    Err(e) => {
                        error!(error = %e, "Serial read failed");
                        break;
                    }
                }
            }

            info!("Serial source shutting down");
            let _ = tx.blocking_send(LinkEvent::Closed { link });
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_device_fails_to_start() {
        let source = SerialSource::new("/dev/sensorlink-no-such-port", 9600);
        let result = source.start(CancellationToken::new()).await;
        assert!(result.is_err());
    }
}
