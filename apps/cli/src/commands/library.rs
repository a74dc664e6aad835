use std::sync::Arc;

use anyhow::Result;
use console::style;
use videolang_core::{
    ClientConfig, Library, VideoApi, VideoId, VideolangError, format_qa, format_video_details,
    spawn_poller, status_label,
};

use crate::ui::{create_spinner, fail_mark, ok_mark, print_library, rule};

pub async fn list(api: Arc<dyn VideoApi>, config: &ClientConfig, watch: bool) -> Result<()> {
    if !watch {
        let videos = api.list_videos().await?;
        print_library(&videos);
        return Ok(());
    }

    println!(
        "{}\n",
        style(format!(
            "Refreshing every {}s, Ctrl-C to stop",
            config.poll_interval.as_secs()
        ))
        .dim()
    );

    let (poller, mut snapshots) = spawn_poller(api, config.poll_interval);
    let mut library = Library::new();
    let mut shown = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(videos) = snapshots.borrow_and_update().clone() else {
                    continue;
                };
                if shown && library.videos() == videos.as_slice() {
                    continue;
                }
                library.apply_refresh(videos.to_vec());
                print_library(library.videos());
                println!();
                shown = true;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

pub async fn show(api: Arc<dyn VideoApi>, id: VideoId) -> Result<()> {
    let video = api.get_video(id).await?;
    rule();
    println!("{}", format_video_details(&video));
    Ok(())
}

pub async fn ask(api: Arc<dyn VideoApi>, id: VideoId, question: String) -> Result<()> {
    let mut library = Library::new();
    let video = api.get_video(id).await?;
    library.select_video(video);
    library.set_question(question);

    if let Some(video) = library.selected().filter(|v| !v.processed) {
        println!(
            "{} {}",
            style("Status:").dim(),
            style(status_label(video)).yellow()
        );
        return Err(VideolangError::NotProcessed { id }.into());
    }

    let spinner = create_spinner("Thinking...");
    match library.ask(api.as_ref()).await {
        Ok(entry) => {
            spinner.finish_and_clear();
            rule();
            println!("{}", format_qa(entry));
            Ok(())
        }
        Err(e) => {
            spinner.finish_with_message(format!("{} Failed to get answer", fail_mark()));
            Err(e.into())
        }
    }
}

pub async fn delete(api: Arc<dyn VideoApi>, id: VideoId) -> Result<()> {
    let spinner = create_spinner(&format!("Deleting video #{}...", id));
    match api.delete_video(id).await {
        Ok(()) => {
            spinner.finish_with_message(format!("{} Deleted video #{}", ok_mark(), id));
            Ok(())
        }
        Err(e) => {
            spinner.finish_with_message(format!("{} Could not delete video #{}", fail_mark(), id));
            Err(e.into())
        }
    }
}
