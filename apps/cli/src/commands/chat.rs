use std::sync::Arc;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use videolang_core::{
    ClientConfig, Library, Video, VideoApi, VideoId, format_qa, spawn_poller, status_label,
};

use crate::ui::{create_spinner, fail_mark, rule};

#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Quit,
    History,
    Status,
    Help,
    Switch(VideoId),
    Invalid(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Question(line);
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" | "exit" | "q" => Input::Quit,
        "history" => Input::History,
        "status" => Input::Status,
        "help" => Input::Help,
        "switch" => arg
            .parse::<VideoId>()
            .map(Input::Switch)
            .unwrap_or(Input::Invalid("usage: /switch <video id>")),
        _ => Input::Invalid("unknown command, try /help"),
    }
}

fn print_help() {
    println!(
        "{}",
        style("Type a question and press Enter. Commands: /switch <id>, /history, /status, /quit")
            .dim()
    );
}

fn print_selected(video: &Video) {
    rule();
    println!(
        "{} {}  {}",
        style(format!("#{}", video.id)).cyan(),
        style(&video.title).bold(),
        style(status_label(video)).dim()
    );
    if !video.file_url.is_empty() {
        println!("{}", style(&video.file_url).dim());
    }
    rule();
}

/// Select `id`, preferring the polled list and falling back to a direct fetch
async fn switch_to(library: &mut Library, api: &dyn VideoApi, id: VideoId) -> Result<()> {
    if library.videos().iter().any(|v| v.id == id) {
        library.select(id)?;
    } else {
        let fetched = api.get_video(id).await?;
        library.select_video(fetched);
    }

    if let Some(video) = library.selected() {
        print_selected(video);
    }
    Ok(())
}

async fn ask(library: &mut Library, api: &dyn VideoApi, question: &str) {
    library.set_question(question);
    if let Some(video) = library.selected().filter(|v| !v.processed) {
        println!(
            "{} not ready for questions yet ({})",
            fail_mark(),
            style(status_label(video)).yellow()
        );
        return;
    }

    let spinner = create_spinner("Thinking...");
    match library.ask(api).await {
        Ok(entry) => {
            spinner.finish_and_clear();
            println!("{}", format_qa(entry));
        }
        Err(e) => {
            spinner.finish_with_message(format!("{} Failed to get answer: {}", fail_mark(), e));
        }
    }
}

pub async fn run(api: Arc<dyn VideoApi>, config: &ClientConfig, id: VideoId) -> Result<()> {
    let mut library = Library::new();
    switch_to(&mut library, api.as_ref(), id).await?;
    print_help();

    let (poller, mut snapshots) = spawn_poller(Arc::clone(&api), config.poll_interval);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    Input::Empty => {}
                    Input::Quit => break,
                    Input::Help => print_help(),
                    Input::Invalid(hint) => println!("{}", style(hint).dim()),
                    Input::Status => {
                        if let Some(video) = library.selected() {
                            println!("{} {}", style("Status:").dim(), status_label(video));
                        }
                    }
                    Input::History => {
                        if library.history().is_empty() {
                            println!("{}", style("No questions asked yet").dim());
                        }
                        for entry in library.history() {
                            println!("{}", format_qa(entry));
                        }
                    }
                    Input::Switch(id) => {
                        if let Err(e) = switch_to(&mut library, api.as_ref(), id).await {
                            println!("{} {}", fail_mark(), e);
                        }
                    }
                    Input::Question(question) => ask(&mut library, api.as_ref(), question).await,
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(videos) = snapshots.borrow_and_update().clone() else {
                    continue;
                };
                let before = library.selected().map(status_label);
                library.apply_refresh(videos.to_vec());
                let after = library.selected().map(status_label);
                match after {
                    Some(label) if before.as_ref() != Some(&label) => {
                        println!("{} {}", style("Status:").dim(), style(label).cyan());
                    }
                    _ => {}
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}
