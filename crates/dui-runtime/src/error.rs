#![forbid(unsafe_code)]

//! Configuration and mount errors.
//!
//! Neither error ever escapes a widget instance: configuration errors are
//! logged and replaced by the documented default, mount errors leave the
//! failing instance inert while its siblings mount normally.

use std::fmt;

/// A `data-ui--*-value` attribute could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The attribute is present but its value is malformed.
    InvalidValue {
        attribute: String,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue {
                attribute,
                value,
                expected,
            } => write!(f, "invalid {attribute}={value:?}: expected {expected}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A widget instance could not be mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// A required `data-ui--<controller>-target` element is absent.
    MissingTarget {
        controller: String,
        target: &'static str,
    },
    /// `data-controller` names a widget this runtime does not know.
    UnknownController(String),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget { controller, target } => {
                write!(f, "{controller}: missing required target `{target}`")
            }
            Self::UnknownController(name) => write!(f, "unknown controller `{name}`"),
        }
    }
}

impl std::error::Error for MountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ConfigError::InvalidValue {
            attribute: "data-ui--popover-offset-value".into(),
            value: "wide".into(),
            expected: "a number",
        };
        assert_eq!(
            err.to_string(),
            "invalid data-ui--popover-offset-value=\"wide\": expected a number"
        );

        let err = MountError::MissingTarget {
            controller: "ui--popover".into(),
            target: "content",
        };
        assert_eq!(err.to_string(), "ui--popover: missing required target `content`");
        assert_eq!(
            MountError::UnknownController("ui--nope".into()).to_string(),
            "unknown controller `ui--nope`"
        );
    }
}
