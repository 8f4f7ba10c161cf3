//! The `{input-path, heap-size, stack-size, debug-listing?}` config record.
//! `clap` supplies the command-line flags; an optional on-disk `toml` file
//! supplies defaults that the flags then override.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "vellum", about = "Front end and VM driver for the vellum toolchain.")]
pub struct Cli {
    /// Source file to lex and parse, or a pre-assembled program image to run.
    pub input_path: PathBuf,

    /// Treats `input_path` as an already-assembled program image to load
    /// and run directly, instead of vellum source to compile.
    #[arg(long)]
    pub run: bool,

    #[arg(long)]
    pub heap_size: Option<u32>,

    #[arg(long)]
    pub stack_size: Option<u32>,

    /// Dumps the assembler's listing to stdout alongside normal output.
    #[arg(long)]
    pub debug_listing: bool,

    /// Enables `tracing` output, filtered by `RUST_LOG` (or `info` if unset).
    #[arg(long)]
    pub trace: bool,

    /// Optional TOML config file providing defaults for the fields above.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub heap_size: Option<u32>,
    pub stack_size: Option<u32>,
    pub debug_listing: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub heap_size: u32,
    pub stack_size: u32,
    pub debug_listing: bool,
}

const DEFAULT_HEAP_SIZE: u32 = 1 << 16;
const DEFAULT_STACK_SIZE: u32 = 1 << 16;

impl Config {
    /// Merges the on-disk file config (if any) with the CLI flags, giving
    /// the flags priority over a config-file value over the hardcoded
    /// default.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Config {
        Config {
            heap_size: cli.heap_size.or(file.heap_size).unwrap_or(DEFAULT_HEAP_SIZE),
            stack_size: cli.stack_size.or(file.stack_size).unwrap_or(DEFAULT_STACK_SIZE),
            debug_listing: cli.debug_listing || file.debug_listing.unwrap_or(false),
        }
    }
}

pub fn load_file_config(path: &std::path::Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}
