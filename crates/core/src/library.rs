//! The video library and detail view: polled list, one selected video, and
//! the question/answer history for that video.

use tracing::debug;

use crate::{
    api::VideoApi,
    error::{Result, VideolangError},
    status::ProcessingStage,
    types::{QaEntry, Video, VideoId},
};

#[derive(Debug, Default)]
pub struct Library {
    videos: Vec<Video>,
    selected: Option<Video>,
    question: String,
    history: Vec<QaEntry>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn selected(&self) -> Option<&Video> {
        self.selected.as_ref()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn history(&self) -> &[QaEntry] {
        &self.history
    }

    /// Replace the list with a fresh fetch. The selected video is swapped for
    /// its fresh copy when present; history stays.
    pub fn apply_refresh(&mut self, videos: Vec<Video>) {
        if let Some(selected) = self.selected.as_mut() {
            if let Some(fresh) = videos.iter().find(|v| v.id == selected.id) {
                if fresh.processed != selected.processed {
                    debug!(id = fresh.id, processed = fresh.processed, "selected video changed");
                }
                *selected = fresh.clone();
            }
        }
        self.videos = videos;
    }

    pub fn select(&mut self, id: VideoId) -> Result<&Video> {
        let video = self
            .videos
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(VideolangError::VideoNotFound { id })?;
        Ok(self.select_video(video))
    }

    /// Select a video fetched elsewhere. Always starts a fresh conversation.
    pub fn select_video(&mut self, video: Video) -> &Video {
        self.question.clear();
        self.history.clear();
        self.selected.insert(video)
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn can_ask(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|v| ProcessingStage::of(v).is_ready())
            && !self.question.trim().is_empty()
    }

    /// Send the pending question for the selected video. The exclusive
    /// borrow keeps at most one question in flight.
    pub async fn ask(&mut self, api: &dyn VideoApi) -> Result<&QaEntry> {
        let video = self.selected.as_ref().ok_or(VideolangError::NoSelection)?;
        if !video.processed {
            return Err(VideolangError::NotProcessed { id: video.id });
        }
        if self.question.trim().is_empty() {
            return Err(VideolangError::EmptyQuestion);
        }

        let answer = api.ask(video.id, &self.question).await?;
        let entry = QaEntry {
            question: std::mem::take(&mut self.question),
            answer: answer.answer,
            timestamp: answer.timestamp,
        };
        let index = self.history.len();
        self.history.push(entry);
        Ok(&self.history[index])
    }
}
