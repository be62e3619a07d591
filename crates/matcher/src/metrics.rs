// Optional observer for match outcomes.
//
// Install one process-wide recorder with [`set_match_metrics`]; every
// `MatchEngine` then reports the answering stage and hit count along with
// call latency. No metrics backend is linked here.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::MatchOrigin;

/// Metrics observer for match operations.
pub trait MatchMetrics: Send + Sync {
    /// Record the outcome of one `match_event` call.
    ///
    /// `origin` says whether the rule stage or the fuzzy stage produced the
    /// result, `latency` covers the item load plus both stages, and
    /// `hit_count` is the number of deduplicated items returned.
    fn record_match(&self, origin: MatchOrigin, latency: Duration, hit_count: usize);

    /// Record a failed item-source load.
    fn record_source_failure(&self, _latency: Duration) {}
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global match metrics recorder.
///
/// This is typically called once during startup so all engines share the
/// same metrics backend.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
