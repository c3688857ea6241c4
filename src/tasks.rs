//! Background execution of refresh work
//!
//! Serving paths never poll inline; they hand a [`RefreshTask`] to a
//! [`TaskRunner`] and return immediately. The runner owns delivery
//! semantics; submitting the same target twice in a row is harmless
//! because refreshes re-check the cache before doing any work and
//! concurrent duplicates settle by last-write-wins.

use crate::config::target::VCenterTarget;
use crate::inventory::InventoryCollector;
use std::sync::Arc;
use tracing::error;

/// A unit of refresh work for one target
#[derive(Debug, Clone)]
pub struct RefreshTask {
    /// Target to poll
    pub target: VCenterTarget,
    /// Bypass the pre-flight cache check
    pub force: bool,
}

/// Fire-and-forget execution of refresh tasks.
///
/// `submit` must not block on the poll itself; it only enqueues. The
/// trait seam exists so tests can record submissions instead of running
/// them.
pub trait TaskRunner: Send + Sync {
    /// Enqueue a refresh for execution
    fn submit(&self, task: RefreshTask);
}

/// Runs refresh tasks as detached tokio tasks
pub struct TokioTaskRunner {
    collector: Arc<InventoryCollector>,
}

impl TokioTaskRunner {
    /// Create a runner driving the given collector
    pub fn new(collector: Arc<InventoryCollector>) -> Self {
        Self { collector }
    }
}

impl TaskRunner for TokioTaskRunner {
    fn submit(&self, task: RefreshTask) {
        let collector = Arc::clone(&self.collector);

        tokio::spawn(async move {
            // Poll failures are already recorded in the cache by the
            // collector; an error here means the cache store itself broke
            if let Err(e) = collector.refresh(&task.target, task.force).await {
                error!(
                    server = %task.target.server,
                    error = %e,
                    "Background refresh task failed"
                );
            }
        });
    }
}
