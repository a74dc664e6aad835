//! Videolang Core Library
//!
//! Client for the videolang backend: upload short clips, follow their
//! processing, and ask questions about them.

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod library;
pub mod poller;
pub mod probe;
pub mod status;
pub mod types;
pub mod uploader;

#[cfg(test)]
mod testing;

pub use api::{HttpVideoApi, VideoApi};
pub use config::ClientConfig;
pub use error::{Result, VideolangError};
pub use format::{
    format_qa, format_timestamp, format_uploaded_at, format_video_details, format_video_line,
};
pub use library::Library;
pub use poller::{PollerHandle, VideoSnapshot, spawn_poller};
pub use probe::{DurationProbe, FfprobeDuration, MAX_DURATION_SECS};
pub use status::{ProcessingStage, status_label};
pub use types::{Answer, NewVideo, QaEntry, UploadTarget, Video, VideoId};
pub use uploader::{SelectedFile, UploadStatus, UploadStep, UploadedVideo, Uploader};
