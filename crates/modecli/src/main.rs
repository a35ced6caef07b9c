//! modecli - chord progression analysis from the terminal
//!
//! Subcommands:
//! - `modecli analyze "<chords>"` - modal, functional or combined reading
//! - `modecli suggest <notes>...` - rank modes for a pitch-class collection
//! - `modecli region <notes>... --key <key>` - compare a passage with the global key
//! - `modecli config` - show the effective configuration

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use modeconf::ModeConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use render::Palette;

#[derive(Parser)]
#[command(name = "modecli")]
#[command(about = "Modal and functional analysis of chord progressions")]
#[command(version)]
struct Cli {
    /// Config file, replacing ./modescope.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a chord progression
    Analyze {
        /// Chords separated by spaces and/or bar lines, e.g. "G F | C G"
        progression: String,

        /// Parent key, e.g. "C major" or "f# minor"
        #[arg(short, long)]
        key: Option<String>,

        /// Which reading to show
        #[arg(long, value_enum, default_value_t = View::Comprehensive)]
        view: View,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest modes for a set of notes
    Suggest {
        /// Note names (Eb) or MIDI numbers (63)
        #[arg(required = true)]
        notes: Vec<String>,

        /// Expected tonic, as a note name or MIDI number
        #[arg(short, long)]
        tonic: Option<String>,

        /// Number of suggestions to show
        #[arg(long, default_value = "5")]
        top: usize,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Label a passage as stable, a modulation or a modal shift
    Region {
        /// Notes of the passage, as names or MIDI numbers
        #[arg(required = true)]
        notes: Vec<String>,

        /// Key of the whole piece, e.g. "C major"
        #[arg(short, long)]
        key: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and where it came from
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Comprehensive,
    Modal,
    Functional,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) =
        ModeConfig::load_with_sources_from(cli.config.as_deref()).context("loading configuration")?;

    init_tracing(&config.telemetry.log_level, cli.verbose);
    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    let palette = Palette::new(!cli.no_color && std::io::stdout().is_terminal());

    match cli.command {
        Commands::Analyze {
            progression,
            key,
            view,
            json,
        } => commands::analyze(&config, &progression, key.as_deref(), view, json, &palette),
        Commands::Suggest {
            notes,
            tonic,
            top,
            json,
        } => commands::suggest(&notes, tonic.as_deref(), top, json, &palette),
        Commands::Region { notes, key, json } => commands::region(&notes, &key, json, &palette),
        Commands::Config => {
            commands::show_config(&config, &sources, &palette);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the configured level; `-v` wins over both.
fn init_tracing(level: &str, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
