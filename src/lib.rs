pub mod cli;
pub mod compare;
pub mod dates;
pub mod directors;
pub mod error;
pub mod frame;
pub mod granularity;
pub mod harmonize;
pub mod ingest;
pub mod io_utils;
pub mod merge;
pub mod ranking;
pub mod report;
pub mod table;
pub mod timeline;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("packshot", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => ingest::execute(&args),
        Commands::Top(args) => report::execute_top(&args),
        Commands::Compare(args) => report::execute_compare(&args),
        Commands::Timeline(args) => report::execute_timeline(&args),
    }
}
