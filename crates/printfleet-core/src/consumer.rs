// ── Status consumer ──
//
// Single consumer for all poller output. Drains the status channel
// sequentially and merges each update into the registry, so concurrent
// pollers never race on a record.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::poller::StatusUpdate;
use crate::store::{ApplyOutcome, Registry};

pub(crate) async fn status_consumer_task(
    registry: Arc<Registry>,
    mut rx: mpsc::UnboundedReceiver<StatusUpdate>,
    cancel: CancellationToken,
) {
    info!("status consumer started");
    loop {
        let update = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            update = rx.recv() => match update {
                Some(update) => update,
                None => break,
            },
        };

        let device_id = update.device_id.clone();
        match registry.apply(update).await {
            ApplyOutcome::Applied => trace!(device_id = %device_id, "status applied"),
            ApplyOutcome::Tombstoned => {
                debug!(device_id = %device_id, "dropped update for deleted printer");
            }
            ApplyOutcome::Stale => debug!(device_id = %device_id, "dropped update from stopped poller"),
            ApplyOutcome::Unknown => debug!(device_id = %device_id, "dropped update for unknown printer"),
        }
    }
    debug!("status consumer stopped");
}
