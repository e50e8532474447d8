//! Profiling utilities based on the `puffin` crate.

use std::sync::OnceLock;

pub use puffin::{GlobalProfiler, profile_function, profile_scope};

/// Address the puffin HTTP server listens on.
pub const PUFFIN_ADDR: &str = "0.0.0.0:8585";

/// Profiling backend options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingBackend {
    /// Collect scopes in-process only.
    InProcess,
    /// Send profiling data to puffin_viewer via HTTP.
    PuffinHttp,
}

static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Enable scope collection for the given backend.
///
/// # Example
/// ```no_run
/// use strata_core::profiling::{init_profiling, ProfilingBackend};
///
/// init_profiling(ProfilingBackend::PuffinHttp);
/// ```
pub fn init_profiling(backend: ProfilingBackend) {
    puffin::set_scopes_on(true);

    if backend == ProfilingBackend::PuffinHttp {
        match puffin_http::Server::new(PUFFIN_ADDR) {
            Ok(server) => {
                tracing::info!("Puffin profiler server started on http://{}", PUFFIN_ADDR);
                let _ = PROFILING_SERVER.set(server);
            }
            Err(e) => {
                tracing::error!("Failed to start puffin server: {}", e);
            }
        }
    }
}

/// Mark a frame boundary. Call once per rendered frame.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
