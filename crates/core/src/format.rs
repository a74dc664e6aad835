use chrono::Local;

use crate::{
    status::status_label,
    types::{QaEntry, Video},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Upload time in the local timezone
pub fn format_uploaded_at(video: &Video) -> String {
    video
        .uploaded_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// One-line library entry: id, title, status and upload time
pub fn format_video_line(video: &Video) -> String {
    let mut status = status_label(video);
    if !video.processed && video.processing_progress > 0.0 {
        status.push_str(&format!(" ({:.0}%)", video.processing_progress));
    }
    format!(
        "#{:<4} {} | Status: {} | Uploaded: {}",
        video.id,
        video.title,
        status,
        format_uploaded_at(video)
    )
}

pub fn format_video_details(video: &Video) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", video.title));
    output.push_str(&format!("**Status:** {}\n", status_label(video)));
    output.push_str(&format!("**Uploaded:** {}\n", format_uploaded_at(video)));
    if !video.file_url.is_empty() {
        output.push_str(&format!("**Source:** {}\n", video.file_url));
    }

    if let Some(transcript) = video.transcript.as_deref().filter(|t| !t.trim().is_empty()) {
        output.push_str("\n## Transcript\n\n");
        output.push_str(transcript.trim());
        output.push('\n');
    }

    output
}

pub fn format_qa(entry: &QaEntry) -> String {
    let mut output = String::new();
    output.push_str(&format!("Question: {}\n", entry.question));
    output.push_str(&format!("Answer: {}\n", entry.answer));
    if let Some(secs) = entry.timestamp_secs() {
        output.push_str(&format!(
            "Timestamp: {} seconds [{}]\n",
            secs,
            format_timestamp(secs)
        ));
    }
    output
}
