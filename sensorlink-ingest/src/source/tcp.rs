use std::{net::SocketAddr, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{self, AsyncReadExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::{Span, error, field, info, instrument};

use super::{ByteSource, LinkEvent, LinkId};

#[derive(Debug, thiserror::Error)]
pub enum LinkConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal data channel closed")]
    ChannelClosed,
}

/// Accepts TCP connections; each connection is an independent link.
pub struct TcpSource {
    addr: SocketAddr,
}

impl TcpSource {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl ByteSource for TcpSource {
    type Error = io::Error;

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<LinkEvent>, Self::Error> {
        let (tx, rx) = mpsc::channel(100);
        let addr = self.addr;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "TCP source started");

        tokio::spawn(run_server_loop(listener, tx, cancel));

        Ok(rx)
    }
}

#[instrument(name = "server_loop", skip_all)]
async fn run_server_loop(
    listener: TcpListener,
    tx: mpsc::Sender<LinkEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Closing TCP source");
                break;
            }
            client = listener.accept() => {
                match client {
                    Ok((stream, addr)) => {
                        info!(%addr, "Client connected");

                        let cancel = cancel.clone();
                        let tx = tx.clone();

                        tokio::spawn(async move {
                            let link = LinkId::new();
                            if let Err(e) = handle_link(stream, link, tx.clone(), cancel).await {
                                error!(error = %e, "Connection closed with error");
                            }
                            let _ = tx.send(LinkEvent::Closed { link }).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        if is_transient_error(&e) {
                            sleep(Duration::from_millis(100)).await;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
    }
}

fn is_transient_error(e: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        e.kind(),
        ConnectionRefused | ConnectionAborted | ConnectionReset | OutOfMemory | Other
    )
}

#[instrument(name = "tcp_link", skip_all, fields(link = field::Empty))]
async fn handle_link(
    mut stream: TcpStream,
    link: LinkId,
    tx: mpsc::Sender<LinkEvent>,
    cancel: CancellationToken,
) -> Result<(), LinkConnectionError> {
    Span::current().record("link", field::display(&link.0));

    let mut tmp = [0u8; 256];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown signal received");
                break;
            }
            read = stream.read(&mut tmp) => {
                let n = match read? {
                    0 => {
                        info!("Peer closed connection");
                        break;
                    }
                    n => n,
                };

                let bytes = tmp[..n].into();
                if tx.send(LinkEvent::Data { link, bytes }).await.is_err() {
                    error!("Internal ingest channel closed");
                    return Err(LinkConnectionError::ChannelClosed);
                }
            }
        }
    }

    Ok(())
}
