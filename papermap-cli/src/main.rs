//! papermap CLI: terminal front-end for browsing conference papers.
//!
//! Loads the static JSON files of a conference site from a directory or URL
//! and prints the catalog, the keyword map, or typeahead facets.

mod commands;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// papermap: browse conference papers from the command line
#[derive(Parser, Debug)]
#[command(name = "papermap", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Workspace directory (looked up for `.papermap/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data location: a directory or an http(s) base URL
    #[arg(short, long)]
    data: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// List paper cards, optionally filtered
    Catalog {
        /// Track to load instead of all papers
        #[arg(short, long)]
        track: Option<String>,
        /// Dimension the search value applies to: authors, keywords, titles, session
        #[arg(short, long)]
        filter: Option<String>,
        /// Search value for the chosen dimension
        #[arg(short, long)]
        search: Option<String>,
        /// Restrict to one session, e.g. D3
        #[arg(long)]
        session: Option<String>,
        /// Seed filters from a page URL or query string
        #[arg(long)]
        url: Option<String>,
        /// Put papers marked as read first
        #[arg(long)]
        visited_first: bool,
        /// Keep the file order instead of shuffling
        #[arg(long)]
        no_shuffle: bool,
    },
    /// Show the keyword map: papers grouped by track and keyword
    Keywords {
        /// Track whose papers are highlighted
        #[arg(short, long)]
        track: Option<String>,
        /// Click the leaf for this keyword and list its papers
        #[arg(short, long)]
        select: Option<String>,
        /// Print the weighted tree as JSON
        #[arg(long)]
        json: bool,
        /// Window size the layout frame is fitted to, e.g. 1400x900
        #[arg(long, value_parser = commands::parse_window)]
        window: Option<papermap_core::view::Viewport>,
    },
    /// List distinct values of a filter dimension
    Facets {
        /// authors, keywords, titles or session
        dimension: String,
        /// Only values containing this text, prefix matches first
        #[arg(short, long)]
        prefix: Option<String>,
        /// Maximum number of values
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// List the tracks papers can be restricted to
    Tracks,
    /// Mark a paper as read (or unread)
    MarkRead {
        /// Paper id
        id: String,
        /// Clear the mark instead
        #[arg(long)]
        undo: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "papermap", "papermap")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "papermap.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = commands::resolve_config(&workspace, cli.config.as_deref(), cli.data.as_deref())?;
    commands::handle_command(cli.command, &workspace, &config).await
}
