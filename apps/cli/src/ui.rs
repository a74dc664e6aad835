use std::time::Duration;

use console::{StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};
use videolang_core::{Video, format_video_line};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn ok_mark() -> StyledObject<&'static str> {
    style("✓").green().bold()
}

pub fn fail_mark() -> StyledObject<&'static str> {
    style("✗").red().bold()
}

pub fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub fn print_header() {
    println!(
        "\n{}  {}\n",
        style("videolang").cyan().bold(),
        style("Video Q&A").dim()
    );
}

pub fn print_library(videos: &[Video]) {
    println!("{}", style("Your Videos").bold());
    rule();
    if videos.is_empty() {
        println!("{}", style("No videos yet. Upload one with `videolang upload <file>`.").dim());
        return;
    }
    for video in videos {
        let line = format_video_line(video);
        if video.processed {
            println!("{}", line);
        } else {
            println!("{}", style(line).yellow());
        }
    }
}
