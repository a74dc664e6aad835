//! Human readable labels for the backend's free-text processing status.

use std::fmt;

use crate::types::Video;

const FRAMES_PREFIX: &str = "analyzing frames";
const FRAMES_MARKER: &str = "frames ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage<'a> {
    Ready,
    Downloading,
    AnalyzingFrames { frame: Option<&'a str> },
    Transcribing,
    Other(&'a str),
}

impl<'a> ProcessingStage<'a> {
    pub fn of(video: &'a Video) -> Self {
        if video.processed {
            return ProcessingStage::Ready;
        }

        let status = video.processing_status.as_str();
        match status {
            "downloading" => ProcessingStage::Downloading,
            "transcribing" => ProcessingStage::Transcribing,
            s if s.starts_with(FRAMES_PREFIX) => ProcessingStage::AnalyzingFrames {
                frame: s
                    .split_once(FRAMES_MARKER)
                    .map(|(_, frame)| frame)
                    .filter(|frame| !frame.is_empty()),
            },
            s => ProcessingStage::Other(s),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ProcessingStage::Ready)
    }
}

impl fmt::Display for ProcessingStage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Ready => f.write_str("Ready for questions"),
            ProcessingStage::Downloading => f.write_str("Loading video for analysis"),
            ProcessingStage::AnalyzingFrames { frame: Some(frame) } => {
                write!(f, "Analyzing video: frame {}", frame)
            }
            ProcessingStage::AnalyzingFrames { frame: None } => f.write_str("Analyzing video"),
            ProcessingStage::Transcribing => f.write_str("Creating transcript"),
            ProcessingStage::Other(raw) => f.write_str(raw),
        }
    }
}

/// Status line shown next to a video
pub fn status_label(video: &Video) -> String {
    ProcessingStage::of(video).to_string()
}
