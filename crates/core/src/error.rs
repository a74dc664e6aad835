use std::path::PathBuf;
use thiserror::Error;

use crate::types::VideoId;

#[derive(Error, Debug)]
pub enum VideolangError {
    #[error("{path} is {duration_secs:.1}s long, videos must be {limit_secs:.0}s or shorter")]
    DurationExceeded {
        path: PathBuf,
        duration_secs: f64,
        limit_secs: f64,
    },

    #[error("Could not read video metadata for {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("Request to {endpoint} failed: HTTP {status} {body}")]
    RequestFailed {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Upload to storage bucket {bucket} failed: HTTP {status} {body}")]
    StorageUploadFailed {
        bucket: String,
        status: u16,
        body: String,
    },

    #[error("No file selected for upload")]
    NoFileSelected,

    #[error("No video selected")]
    NoSelection,

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Video {id} is still processing and not ready for questions")]
    NotProcessed { id: VideoId },

    #[error("Video {id} not found")]
    VideoNotFound { id: VideoId },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, VideolangError>;
