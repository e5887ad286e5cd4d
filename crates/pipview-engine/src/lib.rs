//! Capture session engine for pipview.
//!
//! This crate runs one state machine per preview ([`CaptureSession`]) and
//! keeps the set of live previews ([`SessionRegistry`]).

mod error;
mod registry;
mod session;

#[cfg(test)]
mod testing;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{
    CaptureSession, PresentationSurface, SessionContext, SharedSettings, SOURCE_REFRESH_INTERVAL,
};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Install the global tracing subscriber. Called once by the host
/// application at launch.
///
/// `RUST_LOG` overrides the default of debug output for every pipview crate.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging() {
    subscriber().init();
}

/// Like [`init_logging`], but fails instead of panicking when a global
/// subscriber is already installed.
pub fn try_init_logging() -> Result<(), TryInitError> {
    subscriber().try_init()
}

fn subscriber() -> impl SubscriberInitExt {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(tracing_subscriber::fmt::layer())
}

const DEFAULT_FILTER: &str =
    "pipview=debug,pipview_engine=debug,pipview_capture=debug,pipview_selection=debug";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_installs_once() {
        assert!(try_init_logging().is_ok());
        tracing::debug!("Logging initialised");
        assert!(try_init_logging().is_err());
    }
}
