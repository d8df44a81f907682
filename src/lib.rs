pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod io_utils;
pub mod report;
pub mod roles;
pub mod table;
pub mod working;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("yt_mini_analytics", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {:?}", cli.command);
    match cli.command {
        Commands::Report(args) => report::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
    }
}
