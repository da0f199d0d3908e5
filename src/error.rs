//! Error types for the tooth_scan library
//!
//! Detectors and the renderer return these internally. The public
//! convenience functions in the crate root collapse them into empty
//! results after logging, so callers of those never see an error.

use thiserror::Error;

/// Result type alias for tooth_scan operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for detection and rendering operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image file could not be read or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A decoded buffer is not usable (empty, wrong channel count)
    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    /// Annotated image could not be written
    #[error("Failed to write image: {path}")]
    ImageWriteError { path: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Generic processing error
    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },
}

impl AnalysisError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
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

    /// True when the input image could not be turned into pixels at all.
    ///
    /// The crate-level functions hide this from callers, but tests and
    /// orchestration code use it to tell "bad input" from "clean mouth".
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            AnalysisError::ImageLoadError { .. } | AnalysisError::InvalidImage { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::ImageLoadError { .. } | AnalysisError::InvalidImage { .. } => {
                "Could not load the image. Please check the file format and try again.".to_string()
            }
            AnalysisError::ImageWriteError { path } => {
                format!("Could not save the annotated image to {}.", path)
            }
            AnalysisError::ConfigError { .. } | AnalysisError::InvalidParameter { .. } => {
                "The detector configuration is invalid.".to_string()
            }
            _ => "Image analysis failed. Please try with a different image.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failure_classification() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(AnalysisError::image_load("open", io).is_decode_failure());
        assert!(AnalysisError::InvalidImage { reason: "empty".into() }.is_decode_failure());
        assert!(!AnalysisError::ProcessingError { message: "x".into() }.is_decode_failure());
        assert!(!AnalysisError::invalid_parameter("block_size", 4).is_decode_failure());
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = AnalysisError::invalid_parameter("block_size", 4);
        assert_eq!(err.to_string(), "Invalid parameter: block_size = 4");
    }

    #[test]
    fn test_user_message_for_load_error() {
        let err = AnalysisError::InvalidImage { reason: "0x0".into() };
        assert!(err.user_message().contains("Could not load the image"));
    }
}
