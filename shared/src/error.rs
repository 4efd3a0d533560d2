use crate::image::TargetSize;
use lambda_runtime::Error;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Why a single notification record could not be resized and published.
#[derive(Debug, ThisError)]
pub enum ProcessError {
    #[error(
        "Image is too small, image size: {width}x{height}, required size: {}x{}",
        .target.width,
        .target.height
    )]
    ImageSize {
        width: u32,
        height: u32,
        target: TargetSize,
    },

    #[error("local file {} does not exist", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("unrecognised image format in {}", .path.display())]
    UnknownFormat { path: PathBuf },

    #[error("storage transfer failed: {0}")]
    Transfer(#[source] Error),

    #[error("image codec failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("local i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("object key {key:?} is not valid url-encoded utf-8")]
    InvalidKey {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("acl response for {key} rejected: {reason}")]
    AclRejected { key: String, reason: String },
}

/// Coarse classification used for logging and by callers inspecting outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Size,
    FileNotFound,
    Other,
}

impl ProcessError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProcessError::ImageSize { .. } => FailureKind::Size,
            ProcessError::FileNotFound { .. } => FailureKind::FileNotFound,
            _ => FailureKind::Other,
        }
    }
}

/// A notification payload that does not carry what the handler needs.
#[derive(Debug, ThisError)]
pub enum EventError {
    #[error("record {index}: failed to read bucket name from event")]
    MissingBucket { index: usize },

    #[error("record {index}: failed to read object key from event")]
    MissingKey { index: usize },
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid number")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("{var}={value:?} is not a valid flag, expected true/false/1/0")]
    InvalidFlag { var: &'static str, value: String },

    #[error("target size must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("destination key template {template:?} has no {{filename}} placeholder")]
    MissingPlaceholder { template: String },
}
