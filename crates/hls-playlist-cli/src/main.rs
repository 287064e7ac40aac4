//! hls-playlist CLI - HLS playlist inspection tool
//!
//! Features:
//! - Playlist inspection (master and media)
//! - Variant and rendition selection
//! - Playlist regeneration
//! - Live playlist following

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// hls-playlist CLI - HLS playlist toolkit
#[derive(Parser)]
#[command(name = "hls-playlist")]
#[command(version)]
#[command(about = "Inspect, select, regenerate and follow HLS playlists", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Strict RFC 8216 conformance
    #[arg(long, global = true)]
    strict: bool,

    /// JSON file with loading options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory where downloaded playlists are saved
    #[arg(long, global = true)]
    save_files: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a playlist, its variants and renditions
    Inspect {
        /// URL or path to playlist
        source: String,
    },

    /// Select a variant or rendition in a master playlist
    Select {
        /// URL or path to master playlist
        source: String,

        #[command(flatten)]
        selection: Selection,

        /// Type of alternative rendition (AUDIO, VIDEO, SUBTITLES, CLOSED-CAPTIONS)
        #[arg(long)]
        alt_type: Option<String>,

        /// Name of alternative rendition
        #[arg(long)]
        alt_name: Option<String>,

        /// Group id of alternative rendition
        #[arg(long)]
        alt_group_id: Option<String>,

        /// Language of alternative rendition
        #[arg(long)]
        alt_language: Option<String>,
    },

    /// Regenerate the playlist text
    Dump {
        /// URL or path to playlist
        source: String,

        /// Output file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Follow a media playlist, printing segment URLs
    Follow {
        /// URL or path to playlist
        source: String,

        #[command(flatten)]
        selection: Selection,

        /// Stop after this number of segments (0 = complete content)
        #[arg(short, long, default_value = "0")]
        segments: usize,

        /// Start segment index, negative values count from the end
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        start_segment: i64,

        /// Start at the last segment, alias for --start-segment -1
        #[arg(long)]
        live: bool,
    },
}

/// Variant selection criteria in a master playlist
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Use the variant with the lowest bitrate
    #[arg(long)]
    pub lowest_bitrate: bool,

    /// Use the variant with the highest bitrate
    #[arg(long)]
    pub highest_bitrate: bool,

    /// Use the variant with the lowest resolution
    #[arg(long)]
    pub lowest_resolution: bool,

    /// Use the variant with the highest resolution
    #[arg(long)]
    pub highest_resolution: bool,

    /// Minimum bitrate in bits/second
    #[arg(long, default_value = "0")]
    pub min_bitrate: u64,

    /// Maximum bitrate in bits/second
    #[arg(long, default_value = "0")]
    pub max_bitrate: u64,

    /// Minimum video width
    #[arg(long, default_value = "0")]
    pub min_width: u32,

    /// Maximum video width
    #[arg(long, default_value = "0")]
    pub max_width: u32,

    /// Minimum video height
    #[arg(long, default_value = "0")]
    pub min_height: u32,

    /// Maximum video height
    #[arg(long, default_value = "0")]
    pub max_height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    hls_playlist::init();

    let ctx = commands::Context::new(cli.config.as_deref(), cli.strict, cli.save_files, &cli.format)?;

    match cli.command {
        Commands::Inspect { source } => {
            commands::inspect(&ctx, &source)?;
        }
        Commands::Select { source, selection, alt_type, alt_name, alt_group_id, alt_language } => {
            let alt = commands::AltSelection {
                media_type: alt_type.unwrap_or_default(),
                name: alt_name.unwrap_or_default(),
                group_id: alt_group_id.unwrap_or_default(),
                language: alt_language.unwrap_or_default(),
            };
            commands::select(&ctx, &source, &selection, &alt)?;
        }
        Commands::Dump { source, output } => {
            commands::dump(&ctx, &source, output)?;
        }
        Commands::Follow { source, selection, segments, start_segment, live } => {
            if live && start_segment != 0 {
                anyhow::bail!("--live and --start-segment are mutually exclusive");
            }
            let start = if live { -1 } else { start_segment };
            commands::follow(&ctx, &source, &selection, segments, start)?;
        }
    }

    Ok(())
}
