//! Error types for Unity binary parsing and linking
//!
//! Two classes of failure exist. [`BinaryError`] aborts processing of the
//! current file and is returned to the caller. [`SoftFailure`] marks a single
//! object or reference as unavailable; it is logged and recorded, and the
//! rest of the graph keeps loading.

use thiserror::Error;

/// Result type for Unity binary operations
pub type Result<T> = std::result::Result<T, BinaryError>;

/// Fatal errors raised while decoding or encoding Unity binary files
#[derive(Error, Debug)]
pub enum BinaryError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// Unsupported file version
    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(String),

    /// Unsupported compression format
    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    /// Decompression failed
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// Compression failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Not enough data
    #[error("Not enough data: expected {expected}, got {actual}")]
    NotEnoughData { expected: usize, actual: usize },

    /// Invalid signature
    #[error("Invalid signature: expected {expected}, got {actual}")]
    InvalidSignature { expected: String, actual: String },

    /// Offset or length outside of a view
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Write or resize attempted on a buffer that cannot be mutated
    #[error("Buffer is not writable: {0}")]
    ReadOnly(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// A self-check inside the codec failed
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl BinaryError {
    /// Create a new invalid format error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create a new unsupported version error
    pub fn unsupported_version<S: Into<String>>(version: S) -> Self {
        Self::UnsupportedVersion(version.into())
    }

    /// Create a new unsupported compression error
    pub fn unsupported_compression<S: Into<String>>(compression: S) -> Self {
        Self::UnsupportedCompression(compression.into())
    }

    /// Create a new decompression failed error
    pub fn decompression_failed<S: Into<String>>(msg: S) -> Self {
        Self::DecompressionFailed(msg.into())
    }

    /// Create a new compression failed error
    pub fn compression_failed<S: Into<String>>(msg: S) -> Self {
        Self::CompressionFailed(msg.into())
    }

    /// Create a new invalid data error
    pub fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a new not enough data error
    pub fn not_enough_data(expected: usize, actual: usize) -> Self {
        Self::NotEnoughData { expected, actual }
    }

    /// Create a new invalid signature error
    pub fn invalid_signature<S: Into<String>>(expected: S, actual: S) -> Self {
        Self::InvalidSignature {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new out of range error
    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        Self::OutOfRange(msg.into())
    }

    /// Create a new read-only buffer error
    pub fn read_only<S: Into<String>>(msg: S) -> Self {
        Self::ReadOnly(msg.into())
    }

    /// Create a new unsupported feature error
    pub fn unsupported<S: Into<String>>(feature: S) -> Self {
        Self::Unsupported(feature.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Self::Generic(msg.into())
    }

    /// Check if this error is recoverable
    ///
    /// Nothing raised by the codec itself is; a caller may still retry I/O
    /// or pick a different compression for encoding.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BinaryError::Io(_) => true,
            BinaryError::UnsupportedCompression(_) => true, // Might try different compression
            BinaryError::CompressionFailed(_) => true,
            BinaryError::InvalidFormat(_)
            | BinaryError::UnsupportedVersion(_)
            | BinaryError::DecompressionFailed(_)
            | BinaryError::InvalidData(_)
            | BinaryError::NotEnoughData { .. }
            | BinaryError::InvalidSignature { .. }
            | BinaryError::OutOfRange(_)
            | BinaryError::ReadOnly(_)
            | BinaryError::Unsupported(_)
            | BinaryError::Internal(_)
            | BinaryError::Generic(_) => false,
        }
    }
}

// Conversion from other error types
impl From<lz4_flex::block::DecompressError> for BinaryError {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Self::decompression_failed(format!("LZ4 decompression failed: {}", err))
    }
}

impl From<lzma_rs::error::Error> for BinaryError {
    fn from(err: lzma_rs::error::Error) -> Self {
        Self::decompression_failed(format!("LZMA decompression failed: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for BinaryError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::invalid_data(format!("Invalid UTF-8 string: {}", err))
    }
}

impl From<std::str::Utf8Error> for BinaryError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::invalid_data(format!("Invalid UTF-8 string: {}", err))
    }
}

/// Non-fatal failures recorded while loading and linking assets
///
/// Each one leaves a null reference or a missing object behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    /// No loader is registered for the object's class
    #[error("object {path_id} in '{asset}': no loader registered for class {class_id}")]
    UnregisteredClass {
        asset: String,
        path_id: i64,
        class_id: i32,
    },

    /// The object carries managed script data
    #[error("object {path_id} in '{asset}': class {class_id} carries script data")]
    ScriptDataAttached {
        asset: String,
        path_id: i64,
        class_id: i32,
    },

    /// A pointer names a path ID that the asset does not define
    #[error("path ID {path_id} is not defined in '{asset}'")]
    UnknownPathId { asset: String, path_id: i64 },

    /// A pointer names an object that failed to load
    #[error("path ID {path_id} in '{asset}' was not loaded")]
    ObjectUnavailable { asset: String, path_id: i64 },

    /// An external file reference did not match any loaded asset
    #[error("'{asset}' references external file '{path_name}', which is not loaded")]
    UnresolvedExternal { asset: String, path_name: String },

    /// A streamed data reference did not match any resource file
    #[error("'{asset}' references streamed data file '{name}', which is not loaded")]
    UnresolvedStreamedData { asset: String, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BinaryError::invalid_format("test format");
        assert!(matches!(err, BinaryError::InvalidFormat(_)));
        assert_eq!(err.to_string(), "Invalid file format: test format");
    }

    #[test]
    fn test_not_enough_data_error() {
        let err = BinaryError::not_enough_data(100, 50);
        assert!(matches!(err, BinaryError::NotEnoughData { .. }));
        assert_eq!(err.to_string(), "Not enough data: expected 100, got 50");
    }

    #[test]
    fn test_invalid_signature_error() {
        let err = BinaryError::invalid_signature("UnityFS", "UnityWeb");
        assert_eq!(
            err.to_string(),
            "Invalid signature: expected UnityFS, got UnityWeb"
        );
    }

    #[test]
    fn test_internal_errors_are_not_recoverable() {
        assert!(!BinaryError::internal("crc").is_recoverable());
        assert!(!BinaryError::invalid_format("hash").is_recoverable());
        assert!(BinaryError::unsupported_compression("LZHAM").is_recoverable());
    }

    #[test]
    fn test_soft_failure_message() {
        let failure = SoftFailure::UnresolvedExternal {
            asset: "CAB-a".to_string(),
            path_name: "CAB-b".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "'CAB-a' references external file 'CAB-b', which is not loaded"
        );
    }
}
