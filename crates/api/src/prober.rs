use std::sync::Arc;
use std::time::Duration;

use babelcall_services::registry::{CallRegistry, OutboundFrame};
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns the process-wide liveness prober: a protocol-level ping to
/// every open connection on a fixed interval, so idle connections are
/// not dropped by intermediary infrastructure.
pub fn spawn(registry: Arc<CallRegistry>, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            let senders = registry.all_senders();
            let mut pinged = 0usize;
            for sender in senders {
                if sender.try_send(OutboundFrame::Ping).is_ok() {
                    pinged += 1;
                }
            }
            if pinged > 0 {
                debug!(pinged, "liveness pings queued");
            }
        }
    })
}
