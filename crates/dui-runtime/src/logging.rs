#![forbid(unsafe_code)]

//! Optional global subscriber installation.
//!
//! The runtime only emits `tracing` events; hosts that do not install their
//! own subscriber can call [`install`] (feature `subscriber`). With
//! `json-logs`, [`install_json`] emits one JSON object per line.
//!
//! Targets follow crate names, so `dui_widgets=debug` shows every disclosure
//! transition and `dui_runtime=trace` shows timer activity.

use std::fmt;

/// Default filter when neither the argument nor `RUST_LOG` provide one.
pub const DEFAULT_FILTER: &str = "warn";

/// A subscriber could not be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// The filter directive did not parse.
    InvalidFilter(String),
    /// A global subscriber is already set.
    AlreadyInstalled,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter(msg) => write!(f, "invalid log filter: {msg}"),
            Self::AlreadyInstalled => write!(f, "a global tracing subscriber is already installed"),
        }
    }
}

impl std::error::Error for LoggingError {}

#[cfg(feature = "subscriber")]
fn env_filter(filter: Option<&str>) -> Result<tracing_subscriber::EnvFilter, LoggingError> {
    use tracing_subscriber::EnvFilter;

    match filter {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install a human-readable fmt subscriber.
///
/// `filter` uses `RUST_LOG` syntax; `None` reads `RUST_LOG` and falls back to
/// [`DEFAULT_FILTER`].
#[cfg(feature = "subscriber")]
pub fn install(filter: Option<&str>) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter)?)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

/// Install a JSON-lines subscriber.
#[cfg(feature = "json-logs")]
pub fn install_json(filter: Option<&str>) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(filter)?)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

#[cfg(all(test, feature = "subscriber"))]
mod tests {
    use super::*;

    #[test]
    fn bad_filter_is_reported() {
        let err = install(Some("dui_widgets=notalevel")).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter(_)));
    }

    #[test]
    fn second_install_fails_cleanly() {
        let first = install(Some("warn"));
        let second = install(Some("warn"));
        assert!(first.is_ok() || first == Err(LoggingError::AlreadyInstalled));
        assert_eq!(second, Err(LoggingError::AlreadyInstalled));
    }
}
