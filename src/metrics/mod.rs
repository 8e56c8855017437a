use once_cell::sync::OnceCell;
use std::error::Error;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialise the global Prometheus recorder and keep a handle for rendering
/// the exposition format on `/metrics`.
///
/// Calling it multiple times is a no-op after the first success. Without it the
/// counters emitted by scan cycles are simply dropped.
pub fn init() -> Result<(), Box<dyn Error + Send + Sync>> {
    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Render the current metrics, or an empty body if `init` was never called.
pub fn render() -> String {
    PROM_HANDLE.get().map(|h| h.render()).unwrap_or_default()
}
