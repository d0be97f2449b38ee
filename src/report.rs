//! Progress reporting gated on an explicit primary flag.
//!
//! When several copies of a tool run as one process group, each builds the
//! same catalog but only the primary one should narrate progress. The flag is
//! chosen once at construction (see `config::process_rank`) and only affects
//! messages, never what gets indexed or written.

use crate::catalog::ScanSummary;
use std::fmt;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Repeated calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .try_init();
}

#[derive(Clone, Copy, Debug)]
pub struct Reporter {
    primary: bool,
}

impl Reporter {
    pub fn new(primary: bool) -> Self {
        Self { primary }
    }

    /// Primary when this process has rank 0 in its group.
    pub fn from_env() -> Self {
        Self::new(crate::config::process_rank() == 0)
    }

    /// Reporter that never emits anything.
    pub fn silent() -> Self {
        Self::new(false)
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn progress(&self, message: fmt::Arguments<'_>) {
        if self.primary {
            info!("{message}");
        }
    }

    pub fn warning(&self, message: fmt::Arguments<'_>) {
        if self.primary {
            warn!("{message}");
        }
    }

    pub fn scan_finished(&self, summary: &ScanSummary) {
        self.progress(format_args!(
            "indexed {} file(s); {} duplicate sub-axis tuple(s) dropped",
            summary.files_indexed, summary.dropped_collisions
        ));
    }
}
