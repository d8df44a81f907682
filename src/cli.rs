use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{insights::Locale, roles::Metric};

pub const MIN_TOP_N: usize = 5;
pub const MAX_TOP_N: usize = 50;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Summarize exported channel analytics CSV reports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the analytics report (summary cards, type comparison, daily trend, top videos, tips)
    Report(ReportArgs),
    /// Show which uploaded column each metric role resolved to
    Columns(ColumnsArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Mode {
    /// Analyze exported CSV files
    #[default]
    Csv,
    /// Live analytics API (not yet implemented)
    Api,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Exported CSV report(s); repeat for multiple files
    #[arg(short = 'i', long = "input", action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Optional mapping CSV with `Video title`, `duration_sec`, `type` columns
    #[arg(long = "map")]
    pub mapping: Option<PathBuf>,
    /// Metric used to rank the top videos
    #[arg(long = "sort-key", value_enum, default_value = "views")]
    pub sort_key: Metric,
    /// Number of top videos to list (5-50)
    #[arg(long = "top", default_value_t = 10, value_parser = parse_top_n)]
    pub top: usize,
    /// Data source mode
    #[arg(long, value_enum, default_value = "csv")]
    pub mode: Mode,
    /// YAML file with extra header aliases per role
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Language for labels and tips
    #[arg(long = "lang", value_enum, default_value = "en")]
    pub locale: Locale,
    /// Write the daily views series (date,type,views) to this CSV file
    #[arg(long = "chart-output")]
    pub chart_output: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Exported CSV report(s) to inspect
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// YAML file with extra header aliases per role
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputOptions,
}

#[derive(Debug, Args)]
pub struct InputOptions {
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8; a BOM wins)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_top_n(value: &str) -> Result<usize, String> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a whole number"))?;
    if (MIN_TOP_N..=MAX_TOP_N).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!(
            "Top count must be between {MIN_TOP_N} and {MAX_TOP_N}"
        ))
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
