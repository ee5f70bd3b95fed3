use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::pipeline::IngestPipeline;
use crate::source::{LinkEvent, LinkId};
use crate::storage::SensorStorage;

/// Feed every link's bytes through its own pipeline until cancelled or the
/// source channel closes.
///
/// All links share this one task, so storage calls never overlap and a
/// slow store holds back every source.
pub async fn run_collector<S>(
    mut rx: mpsc::Receiver<LinkEvent>,
    storage: S,
    cancel: CancellationToken,
) where
    S: SensorStorage + Clone,
{
    info!("Collector started");

    let mut links: HashMap<LinkId, IngestPipeline<S>> = HashMap::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Collector shutting down");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    info!("Source channel closed, collector shutting down");
                    break;
                };

                match event {
                    LinkEvent::Data { link, bytes } => {
                        let pipeline = links.entry(link).or_insert_with(|| {
                            info!(link = %link.0, "Link opened");
                            IngestPipeline::new(storage.clone())
                        });

                        for &byte in bytes.iter() {
                            if let Err(e) = pipeline.on_byte(byte).await {
                                error!(error = ?e, link = %link.0, "Failed to persist reading");
                            }
                        }
                    }
                    LinkEvent::Closed { link } => {
                        if let Some(pipeline) = links.remove(&link) {
                            let stats = pipeline.stats();
                            info!(
                                link = %link.0,
                                bytes = stats.bytes,
                                frames = stats.frames,
                                discarded = stats.discarded,
                                crc_failures = stats.crc_failures,
                                "Link closed"
                            );
                        }
                    }
                }
            }
        }
    }
}
