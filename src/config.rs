//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::model::Catalog;

pub const MIN_TICK_MS: u64 = 16;
pub const MAX_TICK_MS: u64 = 100;

/// Build DJ sets by wiring songs and transition clips into a queue
#[derive(Parser, Debug, Clone)]
#[command(name = "djset-rs")]
#[command(about = "Terminal DJ set builder")]
#[command(version)]
pub struct Config {
    /// Catalog JSON file; the bundled catalog is used when absent
    #[arg(short, long, env = "DJSET_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Folder the catalog's audio file names are relative to
    #[arg(short, long, default_value = "songs", env = "DJSET_SONGS_DIR")]
    pub songs_dir: PathBuf,

    /// Redraw and position-poll interval in milliseconds
    #[arg(long, default_value_t = 33, env = "DJSET_TICK_MS")]
    pub tick_ms: u64,

    /// Seconds assumed for transition clips without a catalog length
    #[arg(long, default_value_t = 8, env = "DJSET_CLIP_LENGTH")]
    pub clip_length: u64,

    /// Advance a silent clock instead of playing through the audio device
    #[arg(long, env = "DJSET_SILENT")]
    pub silent: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "djset_rs=debug,warn", env = "DJSET_LOG")]
    pub log_filter: String,
}

impl Config {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }

    pub fn clip_length(&self) -> Duration {
        Duration::from_secs(self.clip_length)
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("Failed to load catalog from {}", path.display())),
            None => Catalog::bundled().context("Bundled catalog is invalid"),
        }
    }
}
