//! Error types for the face classification library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Images or matrices in one batch disagree on their dimensions
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Feature type tag outside the five recognised Haar shapes
    #[error("Invalid Haar feature type: ({0}, {1})")]
    InvalidFeatureType(usize, usize),

    /// Boosting or weak-classifier training could not proceed
    #[error("Training error: {0}")]
    TrainingError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Eigen-decomposition or matrix conversion failed
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidFeatureType(4, 1);
        assert_eq!(err.to_string(), "Invalid Haar feature type: (4, 1)");

        let err = Error::ShapeMismatch("image 2 is 10x10, expected 24x24".to_string());
        assert!(err.to_string().starts_with("Shape mismatch"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
