use std::{path::Path, sync::Arc, time::Instant};

use anyhow::Result;
use console::style;
use videolang_core::{
    ClientConfig, FfprobeDuration, UploadStep, Uploader, VideoApi, VideoId, VideolangError,
    format_timestamp, spawn_poller, status_label,
};

use crate::ui::{create_spinner, fail_mark, format_duration, ok_mark};

pub async fn run(
    api: Arc<dyn VideoApi>,
    config: &ClientConfig,
    file: &Path,
    wait: bool,
) -> Result<()> {
    let mut uploader = Uploader::new(Arc::clone(&api), Arc::new(FfprobeDuration));

    let spinner = create_spinner("Reading video metadata...");
    let selected = match uploader.select(file).await {
        Ok(selected) => selected.clone(),
        Err(e) => {
            spinner.finish_with_message(format!("{} {}", fail_mark(), e));
            return Err(e.into());
        }
    };
    spinner.finish_with_message(format!(
        "{} Selected: {} {}",
        ok_mark(),
        style(&selected.name).dim(),
        style(format!("[{}]", format_timestamp(selected.duration_secs))).dim()
    ));

    let started = Instant::now();
    let spinner = create_spinner("Requesting upload URL...");
    let outcome = uploader
        .submit_with(|step| match step {
            UploadStep::RequestingUrl => spinner.set_message("Requesting upload URL..."),
            UploadStep::Uploading { bytes, bucket } => spinner.set_message(format!(
                "Uploading {:.1} MB to {}...",
                bytes as f64 / (1024.0 * 1024.0),
                bucket.unwrap_or_else(|| "storage".to_string())
            )),
            UploadStep::Registering => spinner.set_message("Registering video..."),
        })
        .await;

    let uploaded = match outcome {
        Ok(uploaded) => uploaded,
        Err(e) => {
            spinner.finish_with_message(format!("{} Upload failed", fail_mark()));
            return Err(e.into());
        }
    };
    let label = match uploaded.id() {
        Some(id) => format!("#{} {}", id, uploaded.title),
        None => uploaded.title.clone(),
    };
    spinner.finish_with_message(format!(
        "{} Upload successful: {} {}",
        ok_mark(),
        label,
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    ));

    match (wait, uploaded.id()) {
        (true, Some(id)) => wait_until_processed(api, config, id).await?,
        (true, None) => println!(
            "{}",
            style("The backend did not report the new video's id; follow it with `videolang list --watch`")
                .dim()
        ),
        (false, _) => {}
    }

    Ok(())
}

/// Follow a video through processing using the library poller
async fn wait_until_processed(
    api: Arc<dyn VideoApi>,
    config: &ClientConfig,
    id: VideoId,
) -> Result<()> {
    let started = Instant::now();
    let spinner = create_spinner("Waiting for processing...");
    let (poller, mut snapshots) = spawn_poller(api, config.poll_interval);

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(false),
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(false);
                }
                let Some(videos) = snapshots.borrow_and_update().clone() else {
                    continue;
                };
                let Some(video) = videos.iter().find(|v| v.id == id) else {
                    break Err(VideolangError::VideoNotFound { id });
                };
                spinner.set_message(status_label(video));
                if video.processed {
                    break Ok(true);
                }
            }
        }
    };
    poller.stop().await;

    match outcome {
        Ok(true) => {
            spinner.finish_with_message(format!(
                "{} Ready for questions {}",
                ok_mark(),
                style(format!("[{}]", format_duration(started.elapsed()))).dim()
            ));
            println!(
                "\n{} videolang chat {}\n",
                style("Next:").dim(),
                style(id).cyan()
            );
            Ok(())
        }
        Ok(false) => {
            spinner.finish_with_message(format!(
                "{} Still processing, check later with `videolang list`",
                style("…").yellow()
            ));
            Ok(())
        }
        Err(e) => {
            spinner.finish_with_message(format!("{} {}", fail_mark(), e));
            Err(e.into())
        }
    }
}
