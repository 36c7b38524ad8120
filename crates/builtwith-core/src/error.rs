//! Core error types for the BuiltWith client.
//!
//! Every failure surfaced by the client maps to exactly one [`ErrorKind`].
//! Validation and configuration errors are raised before any network I/O;
//! the remaining kinds describe what happened to a single HTTP exchange.

use crate::types::OutputFormat;
use thiserror::Error;

/// Central error type for all BuiltWith client operations.
#[derive(Error, Debug)]
pub enum BuiltWithError {
    /// Malformed caller input, detected before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials and settings
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection refused, DNS failure, timeout, or a broken response stream
    #[error("transport error: {message}")]
    Transport {
        /// Error message from the transport
        message: String,
    },

    /// The service rejected the API key (HTTP 401/403)
    #[error("authentication failed: status {status}, {message}")]
    Authentication {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Too many requests (HTTP 429)
    #[error("rate limit exceeded: {message}")]
    RateLimited {
        /// Error message
        message: String,
    },

    /// Bad parameters, unknown technology, or an error embedded in a 2xx body
    #[error("request rejected: status {status}, {message}")]
    Request {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Service-side failure (HTTP 5xx or an unexpected status)
    #[error("service error: status {status}, {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// The response body could not be decoded as the declared format
    #[error("failed to parse {format} response: {message}")]
    Parse {
        /// Format the body was declared as
        format: OutputFormat,
        /// Error message
        message: String,
    },
}

/// Discriminant of [`BuiltWithError`], convenient for matching and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`BuiltWithError::Validation`]
    Validation,
    /// See [`BuiltWithError::Config`]
    Configuration,
    /// See [`BuiltWithError::Transport`]
    Transport,
    /// See [`BuiltWithError::Authentication`]
    Authentication,
    /// See [`BuiltWithError::RateLimited`]
    RateLimit,
    /// See [`BuiltWithError::Request`]
    Request,
    /// See [`BuiltWithError::Service`]
    Service,
    /// See [`BuiltWithError::Parse`]
    Parse,
}

impl BuiltWithError {
    /// Shorthand for a [`BuiltWithError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a [`BuiltWithError::Parse`] error.
    pub fn parse(format: OutputFormat, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    /// The kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Request { .. } => ErrorKind::Request,
            Self::Service { .. } => ErrorKind::Service,
            Self::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// The HTTP status that produced this error, if one did.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Request { status, .. }
            | Self::Service { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// No API key in the environment or config
    #[error("API key missing: set {env_var}")]
    MissingApiKey {
        /// Environment variable expected to hold the key
        env_var: &'static str,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `BuiltWithError`.
pub type Result<T> = std::result::Result<T, BuiltWithError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuiltWithError::validation("at most 16 domains per request");
        assert_eq!(
            err.to_string(),
            "validation error: at most 16 domains per request"
        );

        let err = BuiltWithError::Service {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "service error: status 503, unavailable");

        let err = BuiltWithError::parse(OutputFormat::Xml, "unexpected EOF");
        assert_eq!(err.to_string(), "failed to parse xml response: unexpected EOF");
    }

    #[test]
    fn test_error_kind_and_status() {
        let err = BuiltWithError::RateLimited {
            message: "slow down".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.status(), Some(429));

        let err = BuiltWithError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::MissingApiKey {
            env_var: "BUILTWITH_API_KEY",
        };
        let err: BuiltWithError = config_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("BUILTWITH_API_KEY"));
    }
}
