use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Result, VideolangError};

/// Longest clip the backend accepts, in seconds
pub const MAX_DURATION_SECS: f64 = 180.0;

#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_secs(&self, path: &Path) -> Result<f64>;
}

/// Reads container duration with ffprobe
#[derive(Debug, Clone, Default)]
pub struct FfprobeDuration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_ffprobe_json(path: &Path, json: &str) -> Result<f64> {
    let output: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| VideolangError::ProbeFailed {
            path: path.to_path_buf(),
            reason: format!("unexpected ffprobe output: {}", e),
        })?;

    let raw = output.format.duration.ok_or_else(|| VideolangError::ProbeFailed {
        path: path.to_path_buf(),
        reason: "container reports no duration".to_string(),
    })?;

    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .ok_or_else(|| VideolangError::ProbeFailed {
            path: path.to_path_buf(),
            reason: format!("invalid duration {:?}", raw),
        })
}

#[async_trait]
impl DurationProbe for FfprobeDuration {
    async fn duration_secs(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("json")
            .arg(path)
            .output()
            .await
            .map_err(|e| VideolangError::ProbeFailed {
                path: path.to_path_buf(),
                reason: format!("could not run ffprobe: {}", e),
            })?;

        if !output.status.success() {
            return Err(VideolangError::ProbeFailed {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_ffprobe_json(path, &String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration() {
        let json = r#"{ "format": { "duration": "179.966000" } }"#;
        let secs = parse_ffprobe_json(Path::new("a.mp4"), json).unwrap();
        assert!((secs - 179.966).abs() < 1e-9);
    }

    #[test]
    fn missing_or_bad_duration_fails() {
        let missing = parse_ffprobe_json(Path::new("a.mp4"), r#"{ "format": {} }"#);
        assert!(matches!(missing, Err(VideolangError::ProbeFailed { .. })));

        let bad = parse_ffprobe_json(Path::new("a.mp4"), r#"{ "format": { "duration": "N/A" } }"#);
        assert!(matches!(bad, Err(VideolangError::ProbeFailed { .. })));

        let garbage = parse_ffprobe_json(Path::new("a.mp4"), "not json");
        assert!(matches!(garbage, Err(VideolangError::ProbeFailed { .. })));
    }
}
