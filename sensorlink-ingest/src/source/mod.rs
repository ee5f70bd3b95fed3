pub mod mock;
pub mod serial;
pub mod tcp;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

/// Identifies one byte stream. Every link gets its own frame synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub Ulid);

impl LinkId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Data received from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Raw bytes, in arrival order. Chunk boundaries mean nothing.
    Data { link: LinkId, bytes: Box<[u8]> },
    /// The link went away; any partial frame on it is abandoned.
    Closed { link: LinkId },
}

/// Trait for transports that supply raw bytes.
///
/// Implementations spawn background tasks that send [`LinkEvent`]s to an
/// mpsc channel. The receiver is returned from `start`.
#[async_trait]
pub trait ByteSource: Send + Sync + 'static {
    /// Error type for this source implementation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start reading bytes.
    ///
    /// The background tasks run until the cancellation token is cancelled
    /// or the transport closes.
    async fn start(&self, cancel: CancellationToken)
    -> Result<mpsc::Receiver<LinkEvent>, Self::Error>;
}
