use std::{path::PathBuf, sync::OnceLock};

use clap::Parser;

/// HTTP control plane for Docker containers with a SQLite inventory.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the config file.
    #[arg(short, long, default_value = "corral.toml")]
    pub config: PathBuf,
    /// Load and validate the config file, then exit.
    #[arg(long)]
    pub check: bool,
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}
