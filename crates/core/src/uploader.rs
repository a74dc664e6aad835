//! Pick a local clip, check its length, and push it through the three-step
//! upload: pre-signed URL, direct PUT to storage, then the video record.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    api::VideoApi,
    error::{Result, VideolangError},
    probe::{DurationProbe, MAX_DURATION_SECS},
    types::{NewVideo, Video, VideoId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub duration_secs: f64,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadStep {
    RequestingUrl,
    Uploading { bytes: u64, bucket: Option<String> },
    Registering,
}

/// A registered upload. `video` is the backend record when the registration
/// reply or a follow-up listing carried it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedVideo {
    pub title: String,
    pub file_url: String,
    pub video: Option<Video>,
}

impl UploadedVideo {
    pub fn id(&self) -> Option<VideoId> {
        self.video.as_ref().map(|v| v.id)
    }
}

/// MIME type sent with the storage PUT
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Storage key for an upload; the millisecond prefix keeps repeated uploads
/// of the same file apart
pub fn storage_filename(name: &str) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), name)
}

pub struct Uploader {
    api: Arc<dyn VideoApi>,
    probe: Arc<dyn DurationProbe>,
    selected: Option<SelectedFile>,
    status: UploadStatus,
    max_duration_secs: f64,
}

impl Uploader {
    pub fn new(api: Arc<dyn VideoApi>, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            api,
            probe,
            selected: None,
            status: UploadStatus::Idle,
            max_duration_secs: MAX_DURATION_SECS,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn max_duration_secs(&self) -> f64 {
        self.max_duration_secs
    }

    /// Accept `path` for upload if its probed duration is within the limit.
    /// A rejected file leaves the previous selection untouched.
    pub async fn select(&mut self, path: impl AsRef<Path>) -> Result<&SelectedFile> {
        let path = path.as_ref();
        let duration_secs = self.probe.duration_secs(path).await?;

        if duration_secs > self.max_duration_secs {
            warn!(path = %path.display(), duration_secs, "video too long");
            return Err(VideolangError::DurationExceeded {
                path: path.to_path_buf(),
                duration_secs,
                limit_secs: self.max_duration_secs,
            });
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());

        debug!(path = %path.display(), duration_secs, "video selected");
        Ok(&*self.selected.insert(SelectedFile {
            path: path.to_path_buf(),
            name,
            duration_secs,
            content_type: content_type_for(path),
        }))
    }

    pub async fn submit(&mut self) -> Result<UploadedVideo> {
        self.submit_with(|_| {}).await
    }

    /// Run the upload sequence, telling `on_step` as each step starts.
    /// Whatever the outcome the selection is cleared; a failure leaves the
    /// status at `Error`.
    pub async fn submit_with(
        &mut self,
        mut on_step: impl FnMut(UploadStep),
    ) -> Result<UploadedVideo> {
        let Some(file) = self.selected.clone() else {
            return Err(VideolangError::NoFileSelected);
        };

        self.status = UploadStatus::Uploading;
        let outcome = self.run_upload(&file, &mut on_step).await;
        self.selected = None;

        match outcome {
            Ok(uploaded) => {
                info!(id = ?uploaded.id(), title = %uploaded.title, "upload complete");
                self.status = UploadStatus::Idle;
                Ok(uploaded)
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "upload failed");
                self.status = UploadStatus::Error;
                Err(e)
            }
        }
    }

    async fn run_upload(
        &self,
        file: &SelectedFile,
        on_step: &mut impl FnMut(UploadStep),
    ) -> Result<UploadedVideo> {
        on_step(UploadStep::RequestingUrl);
        let target = self
            .api
            .request_upload_url(&storage_filename(&file.name))
            .await?;

        let bytes = fs::metadata(&file.path).await?.len();
        on_step(UploadStep::Uploading {
            bytes,
            bucket: target.bucket(),
        });
        self.api.put_object(&target, &file.path, file.content_type).await?;

        on_step(UploadStep::Registering);
        let new_video = NewVideo {
            title: file.name.clone(),
            file_url: target.file_url,
        };
        let video = match self.api.create_video(&new_video).await? {
            Some(video) => Some(video),
            None => self.find_registered(&new_video.file_url).await,
        };

        Ok(UploadedVideo {
            title: new_video.title,
            file_url: new_video.file_url,
            video,
        })
    }

    /// Look the new record up by its storage URL. The upload already
    /// succeeded, so a failed lookup only loses the id.
    async fn find_registered(&self, file_url: &str) -> Option<Video> {
        match self.api.list_videos().await {
            Ok(videos) => videos.into_iter().find(|v| v.file_url == file_url),
            Err(e) => {
                warn!(error = %e, file_url, "could not look up registered video");
                None
            }
        }
    }
}
