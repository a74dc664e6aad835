//! In-memory fakes for the network and ffprobe seams.

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    api::VideoApi,
    error::{Result, VideolangError},
    probe::DurationProbe,
    types::{Answer, NewVideo, UploadTarget, Video, VideoId},
};

pub fn video(id: VideoId, status: &str, processed: bool) -> Video {
    Video {
        id,
        title: format!("clip-{}.mp4", id),
        file_url: format!("https://bucket.s3.amazonaws.com/videos/clip-{}.mp4", id),
        transcript: None,
        processed,
        uploaded_at: Utc::now(),
        processing_status: status.to_string(),
        processing_progress: 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    List,
    Get,
    UploadUrl,
    Put,
    Create,
    Ask,
    Delete,
}

fn failed(call: Call) -> VideolangError {
    VideolangError::RequestFailed {
        endpoint: format!("{:?}", call),
        status: 500,
        body: "fake failure".to_string(),
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub videos: Mutex<Vec<Video>>,
    pub calls: Mutex<Vec<Call>>,
    pub failing: Mutex<HashSet<Call>>,
    pub created: Mutex<Vec<NewVideo>>,
    pub uploads: Mutex<Vec<(String, u64, String)>>,
    pub requested_filenames: Mutex<Vec<String>>,
    pub questions: Mutex<Vec<(VideoId, String)>>,
    /// Registration succeeds but the reply carries no record
    pub terse_create: AtomicBool,
    /// Extra time every listing takes
    pub list_latency: Mutex<Duration>,
}

impl FakeApi {
    pub fn with_videos(videos: Vec<Video>) -> Self {
        Self {
            videos: Mutex::new(videos),
            ..Self::default()
        }
    }

    pub fn fail(&self, call: Call) {
        self.failing.lock().unwrap().insert(call);
    }

    pub fn recover(&self, call: Call) {
        self.failing.lock().unwrap().remove(&call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&call) {
            return Err(failed(call));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn list_videos(&self) -> Result<Vec<Video>> {
        self.record(Call::List)?;
        let latency = *self.list_latency.lock().unwrap();
        tokio::time::sleep(latency).await;
        Ok(self.videos.lock().unwrap().clone())
    }

    async fn get_video(&self, id: VideoId) -> Result<Video> {
        self.record(Call::Get)?;
        self.videos
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(VideolangError::VideoNotFound { id })
    }

    async fn request_upload_url(&self, filename: &str) -> Result<UploadTarget> {
        self.record(Call::UploadUrl)?;
        self.requested_filenames.lock().unwrap().push(filename.to_string());
        Ok(UploadTarget {
            upload_url: format!("https://bucket.s3.amazonaws.com/videos/{}?sig=1", filename),
            file_url: format!("https://bucket.s3.us-east-1.amazonaws.com/videos/{}", filename),
        })
    }

    async fn put_object(
        &self,
        target: &UploadTarget,
        path: &Path,
        content_type: &str,
    ) -> Result<()> {
        self.record(Call::Put)?;
        let size = tokio::fs::metadata(path).await?.len();
        self.uploads.lock().unwrap().push((
            target.upload_url.clone(),
            size,
            content_type.to_string(),
        ));
        Ok(())
    }

    async fn create_video(&self, new_video: &NewVideo) -> Result<Option<Video>> {
        self.record(Call::Create)?;
        self.created.lock().unwrap().push(new_video.clone());

        let mut videos = self.videos.lock().unwrap();
        let id = videos.iter().map(|v| v.id).max().unwrap_or(0) + 1;
        let mut created = video(id, "pending", false);
        created.title = new_video.title.clone();
        created.file_url = new_video.file_url.clone();
        videos.push(created.clone());
        if self.terse_create.load(Ordering::Relaxed) {
            return Ok(None);
        }
        Ok(Some(created))
    }

    async fn ask(&self, id: VideoId, question: &str) -> Result<Answer> {
        self.record(Call::Ask)?;
        self.questions.lock().unwrap().push((id, question.to_string()));
        let n = self.questions.lock().unwrap().len();
        Ok(Answer {
            answer: format!("answer {} to {}", n, question),
            timestamp: if question.contains("when") { 42.0 } else { 0.0 },
        })
    }

    async fn delete_video(&self, id: VideoId) -> Result<()> {
        self.record(Call::Delete)?;
        let mut videos = self.videos.lock().unwrap();
        let before = videos.len();
        videos.retain(|v| v.id != id);
        if videos.len() == before {
            return Err(VideolangError::VideoNotFound { id });
        }
        Ok(())
    }
}

/// Probe that reports a fixed duration and counts invocations
pub struct FixedProbe {
    pub duration: Option<f64>,
    pub calls: AtomicUsize,
}

impl FixedProbe {
    pub fn secs(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            duration: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn duration_secs(&self, path: &Path) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.duration.ok_or_else(|| VideolangError::ProbeFailed {
            path: path.to_path_buf(),
            reason: "no metadata".to_string(),
        })
    }
}
