//! Per-request measurements.

use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetrics {
    pub endpoint: &'static str,
    pub file_name: Option<Utf8PathBuf>,
    pub elapsed: Duration,
    pub locations: usize,
    pub fixes: usize,
}

/// Receives metrics once per completed request.
pub trait RequestObserver: Send + Sync {
    fn on_request(&self, metrics: &RequestMetrics);
}

/// Logs each request at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, metrics: &RequestMetrics) {
        info!(
            endpoint = metrics.endpoint,
            file = metrics.file_name.as_ref().map(|f| f.as_str()).unwrap_or("*"),
            elapsed_ms = metrics.elapsed.as_millis() as u64,
            locations = metrics.locations,
            fixes = metrics.fixes,
            "request completed"
        );
    }
}
