use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type VideoId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub file_url: String,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processed: bool,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processing_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processing_progress: f64,
}

/// One answered question, kept in the order it was asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: f64,
}

impl QaEntry {
    /// Seconds into the video the answer refers to. Zero means the answer
    /// is not tied to a moment.
    pub fn timestamp_secs(&self) -> Option<f64> {
        (self.timestamp > 0.0).then_some(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadUrlRequest {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub upload_url: String,
    pub file_url: String,
}

impl UploadTarget {
    /// Bucket name taken from the first label of the pre-signed URL host
    pub fn bucket(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.upload_url).ok()?;
        let host = url.host_str()?;
        host.split('.').next().map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideo {
    pub title: String,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
