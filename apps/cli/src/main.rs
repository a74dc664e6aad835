use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use videolang_core::{ClientConfig, HttpVideoApi, VideoApi, VideoId};

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "videolang")]
#[command(about = "Upload short videos, follow their processing, and ask questions about them")]
struct Cli {
    /// Backend base URL. Overrides the config file and VIDEOLANG_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Seconds between library refreshes. Overrides VIDEOLANG_POLL_SECS.
    #[arg(long, global = true)]
    poll_secs: Option<u64>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video file (3 minutes or shorter)
    Upload {
        file: PathBuf,

        /// Keep polling until the video is ready for questions
        #[arg(short, long)]
        wait: bool,
    },

    /// List your videos and their processing status
    List {
        /// Refresh the list until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },

    /// Show one video, including its transcript when available
    Show { id: VideoId },

    /// Ask a single question about a processed video
    Ask {
        id: VideoId,

        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Interactive question session for a video
    Chat { id: VideoId },

    /// Delete a video
    Delete { id: VideoId },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "videolang=debug,videolang_core=debug"
    } else {
        "videolang=warn,videolang_core=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load().await?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_base_url(api_url.clone())?;
    }
    if let Some(secs) = cli.poll_secs {
        config = config.with_poll_interval(Duration::from_secs(secs))?;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).await?;
    tracing::debug!(base_url = %config.base_url, "using backend");
    let api: Arc<dyn VideoApi> = Arc::new(HttpVideoApi::new(&config)?);

    print_header_for(&cli.command);

    match cli.command {
        Command::Upload { file, wait } => commands::upload::run(api, &config, &file, wait).await,
        Command::List { watch } => commands::library::list(api, &config, watch).await,
        Command::Show { id } => commands::library::show(api, id).await,
        Command::Ask { id, question } => {
            commands::library::ask(api, id, question.join(" ")).await
        }
        Command::Chat { id } => commands::chat::run(api, &config, id).await,
        Command::Delete { id } => commands::library::delete(api, id).await,
    }
}

fn print_header_for(command: &Command) {
    if matches!(command, Command::Upload { .. } | Command::Chat { .. }) {
        ui::print_header();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
