use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// LogTag adds tags to log messages.
#[derive(Parser, Debug)]
#[command(name = "logtag", author, version, about, long_about = None)]
pub struct Cli {
    /// Files (or glob patterns) to add tags to
    pub files: Vec<String>,

    /// Files (or glob patterns) to add tags to; overrides positional files
    #[arg(short = 'f', long = "file", num_args = 1..)]
    pub file: Option<Vec<String>>,

    /// Also write the report to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Sort log lines by their text before tagging
    #[arg(short, long)]
    pub sort: bool,

    /// Only show lines that received at least one tag
    #[arg(short, long)]
    pub uniq: bool,

    /// Do not print the report to stdout
    #[arg(long)]
    pub hidden: bool,

    /// Config directory searched before the built-in locations
    #[arg(long, env = "LOGTAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Display config file to use instead of searching (must decode)
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Extra tag rule file, merged after all directories (must decode)
    #[arg(long = "tag-file")]
    pub tag_files: Vec<PathBuf>,

    /// Only evaluate these categories (replaces the config allow-list)
    #[arg(short = 'c', long = "category")]
    pub categories: Vec<String>,

    /// Keep at most one tag per category
    #[arg(long)]
    pub stop_first_tag: bool,

    /// Stop at the first category that produced a tag
    #[arg(long)]
    pub stop_first_category: bool,

    /// Report format
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Control colored diagnostics
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Input patterns: `--file` wins over positional arguments.
    pub fn input_patterns(&self) -> &[String] {
        match &self.file {
            Some(files) if !files.is_empty() => files,
            _ => &self.files,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain aligned table
    Text,
    /// JSON array of row objects
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
