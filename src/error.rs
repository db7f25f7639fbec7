//! Error types and handling for `GeoAlert`

use thiserror::Error;

/// Main error type for the `GeoAlert` application
#[derive(Error, Debug)]
pub enum GeoAlertError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// No data could be obtained from any upstream source
    #[error("Data unavailable: {message}")]
    Unavailable { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GeoAlertError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new data-unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GeoAlertError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            GeoAlertError::Api { .. } => {
                "Unable to connect to external services. Please check your internet connection."
                    .to_string()
            }
            GeoAlertError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            GeoAlertError::Unavailable { .. } => {
                "Data unavailable. Please try refreshing in a moment.".to_string()
            }
            GeoAlertError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = GeoAlertError::config("bad interval");
        assert!(matches!(config_err, GeoAlertError::Config { .. }));

        let api_err = GeoAlertError::api("connection failed");
        assert!(matches!(api_err, GeoAlertError::Api { .. }));

        let unavailable = GeoAlertError::unavailable("all cities failed");
        assert!(matches!(unavailable, GeoAlertError::Unavailable { .. }));
    }

    #[test]
    fn test_user_messages() {
        let api_err = GeoAlertError::api("test");
        assert!(api_err.user_message().contains("Unable to connect"));

        let validation_err = GeoAlertError::validation("latitude 91");
        assert!(validation_err.user_message().contains("latitude 91"));

        let unavailable = GeoAlertError::unavailable("test");
        assert!(unavailable.user_message().starts_with("Data unavailable"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GeoAlertError = io_err.into();
        assert!(matches!(err, GeoAlertError::Io { .. }));
    }
}
