use crate::{
    logging,
    profiling::{self, ProfilingBackend},
};

/// Process-level configuration for a Strata renderer.
#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing` filter directives. `None` defers to `RUST_LOG` and the
    /// built-in default.
    pub log_filter: Option<String>,
    pub profiling: ProfilingMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: None,
            profiling: ProfilingMode::Off,
        }
    }
}

impl Config {
    /// Install logging and start profiling according to this configuration.
    pub fn init(&self) {
        match &self.log_filter {
            Some(filter) => logging::init_with_filter(filter),
            None => logging::init(),
        }

        match self.profiling {
            ProfilingMode::Off => {}
            ProfilingMode::On => profiling::init_profiling(ProfilingBackend::InProcess),
            ProfilingMode::WithWebserver => profiling::init_profiling(ProfilingBackend::PuffinHttp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Profiling scopes are not collected
    Off,
    /// Scopes are collected in-process
    On,
    /// Scopes are collected and served to `puffin_viewer` over HTTP
    WithWebserver,
}
