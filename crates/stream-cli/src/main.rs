use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stream_core::config::AppConfig;
use stream_core::context::AppContext;
use stream_core::error::{CoreError, DiscoveryError, SearchError};
use stream_core::health::DiscoveryEvent;
use stream_core::models::{SearchOptions, SearchRecord, SortBy};
use stream_core::search::{PageOutcome, SearchEvent};

#[derive(Debug, Parser)]
#[command(name = "stream", version, about = "Search Invidious mirrors for playable videos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Health-check the mirror directory and list strong instances.
    Discover {
        #[arg(long)]
        json: bool,
    },
    /// Discover mirrors, then search them.
    Search {
        query: String,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// relevance, rating, upload_date or view_count. Defaults to the config value.
        #[arg(long)]
        sort: Option<SortBy>,
        /// Print one JSON record per line.
        #[arg(long)]
        json: bool,
    },
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the config file location.
    Path,
    /// Print the effective configuration.
    Show,
    /// Write the effective configuration to the config file.
    Init,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}", .0.user_message())]
    Discovery(#[from] DiscoveryError),
    #[error("{}", .0.user_message())]
    Search(#[from] SearchError),
    #[error("{0}")]
    PageFailed(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("serialization failed: {0}")]
    Toml(#[from] toml::ser::Error),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stream=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Discover { json } => {
            let ctx = AppContext::load()?;
            discover(&ctx, true, json).await?;
            Ok(())
        }
        Command::Search {
            query,
            pages,
            sort,
            json,
        } => {
            let ctx = AppContext::load()?;
            discover(&ctx, false, false).await?;
            let options = SearchOptions {
                sort_by: sort.unwrap_or(ctx.config().search.sort_by),
            };
            search(&ctx, &query, options, pages, json).await
        }
        Command::Config(cmd) => config(cmd),
    }
}

/// Run discovery, printing strong instances as they are confirmed when
/// `verbose` is set.
async fn discover(
    ctx: &AppContext<stream_api::MirrorClient>,
    verbose: bool,
    json: bool,
) -> Result<(), CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = async move {
        let result = ctx.discover(&tx).await;
        drop(tx);
        result
    };
    let print = async {
        while let Some(event) = rx.recv().await {
            match event {
                DiscoveryEvent::StrongInstanceFound(mirror) if verbose => {
                    if json {
                        match serde_json::to_string(&mirror) {
                            Ok(line) => println!("{line}"),
                            Err(e) => debug!(error = %e, "Could not encode mirror"),
                        }
                    } else {
                        println!("{mirror}");
                    }
                }
                DiscoveryEvent::Finished { strong, rejected } if verbose && !json => {
                    eprintln!("{strong} strong, {rejected} rejected");
                }
                _ => {}
            }
        }
    };
    let (result, ()) = tokio::join!(run, print);
    result?;
    Ok(())
}

async fn search(
    ctx: &AppContext<stream_api::MirrorClient>,
    query: &str,
    options: SearchOptions,
    pages: u32,
    json: bool,
) -> Result<(), CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = ctx.start_search(query, options, tx)?;

    let run = async move {
        let mut outcome = session.start().await;
        for _ in 1..pages {
            if !matches!(outcome, PageOutcome::Emitted(_) | PageOutcome::NoResults) {
                break;
            }
            outcome = session.load_more().await;
        }
        // Dropping the session closes the channel.
        outcome
    };
    let print = async {
        let mut failure = None;
        while let Some(event) = rx.recv().await {
            match event {
                SearchEvent::Result(record) => print_record(&record, json),
                SearchEvent::PageFailed { message, .. } => failure = Some(message),
            }
        }
        failure
    };

    let (outcome, failure) = tokio::join!(run, print);
    debug!(?outcome, "Search finished");
    match failure {
        Some(message) => Err(CliError::PageFailed(message)),
        None => Ok(()),
    }
}

fn print_record(record: &SearchRecord, json: bool) {
    if json {
        match serde_json::to_string(record) {
            Ok(line) => println!("{line}"),
            Err(e) => debug!(error = %e, "Could not encode record"),
        }
        return;
    }
    match record {
        SearchRecord::Video(v) => {
            println!(
                "[video] {} by {} ({}) via {}",
                v.title,
                v.author,
                format_duration(v.duration_seconds),
                v.mirror
            );
            println!("  play:  {}", v.playback_url);
            if let Some(url) = &v.video_download_url {
                println!("  video: {url}");
            }
            if let Some(url) = &v.audio_download_url {
                println!("  audio: {url}");
            }
        }
        SearchRecord::Playlist(p) => {
            println!("[playlist] {} by {} ({} videos)", p.title, p.author, p.item_count);
        }
    }
}

fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

fn config(cmd: ConfigCommand) -> Result<(), CliError> {
    match cmd {
        ConfigCommand::Path => println!("{}", AppConfig::config_path().display()),
        ConfigCommand::Show => print!("{}", toml::to_string_pretty(&AppConfig::load()?)?),
        ConfigCommand::Init => {
            let path = AppConfig::load()?.save()?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
