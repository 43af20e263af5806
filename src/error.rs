//! Error types for the sigverify library

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for sigverify operations
pub type Result<T> = std::result::Result<T, VerificationError>;

/// Error types for signature comparison
///
/// Only hard failures live here. An image that yields no usable signature
/// pattern is reported through [`crate::ComparisonStatus::NoPatterns`].
#[derive(Error, Debug)]
pub enum VerificationError {
    /// Image file could not be opened, recognised or decoded
    #[error("Failed to load image {}: {message}", .path.display())]
    ImageLoadError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Signature detector could not be built or failed while running
    #[error("Detector failure: {message}")]
    DetectorError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Configuration file could not be read, written or parsed
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl VerificationError {
    /// Create an image load error naming the failing path
    pub fn image_load<E>(path: &Path, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            path: path.to_path_buf(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a detector error with context
    pub fn detector<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DetectorError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an OpenCV error with context
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCvError {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error aborts the enclosing comparison
    ///
    /// Load and detector failures are fatal. Parameter and configuration
    /// problems can be fixed by the caller before retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VerificationError::ImageLoadError { .. }
                | VerificationError::DetectorError { .. }
                | VerificationError::OpenCvError { .. }
        )
    }

    /// Path of the image that failed to load, if any
    pub fn failing_path(&self) -> Option<&Path> {
        match self {
            VerificationError::ImageLoadError { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            VerificationError::ImageLoadError { path, .. } => {
                format!("Could not load image at {}", path.display())
            }
            VerificationError::DetectorError { .. } => {
                "The signature detector failed. Please check the model file.".to_string()
            }
            VerificationError::InvalidParameter { parameter, value } => {
                format!("Invalid setting {} = {}.", parameter, value)
            }
            VerificationError::ConfigError { .. } => {
                "Could not read the configuration file.".to_string()
            }
            _ => "Signature comparison failed. Please try with different images.".to_string(),
        }
    }
}
