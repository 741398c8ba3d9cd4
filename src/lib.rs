pub mod cli;
pub mod config;
pub mod decode;
pub mod error;
pub mod input;
pub mod logging;
pub mod matcher;
pub mod output;
pub mod report;
pub mod rules;

pub use cli::{Cli, ColorMode, OutputFormat, cli_parse};
pub use config::{
    ColumnKind, ColumnSpec, ConfigResolver, Resolution, ResolvedConfig, SearchPaths, resolve,
};
pub use error::LogTagError;
pub use input::LogLine;
pub use matcher::{MatchOptions, MatchResult, TagMatch, TagMatcher, match_text};
pub use report::{Report, ReportBuilder, ReportRow, build_row};
pub use rules::{Category, KeywordRule};

use crate::input::{expand_patterns, read_log_files, sort_lines};
use crate::output::emit_report;

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

/// Resolve rules, tag every input line and build the report.
///
/// Nothing is written here; fatal configuration errors surface before any
/// input file is read.
pub fn build_report(cli: &Cli) -> Result<Report, LogTagError> {
    let patterns = cli.input_patterns();
    if patterns.is_empty() {
        return Err(LogTagError::InputMissing);
    }

    let resolver = ConfigResolver::new(SearchPaths::discover(cli.config.as_deref()))
        .config_file(cli.config_file.clone())
        .tag_files(cli.tag_files.clone());
    let Resolution {
        mut config,
        categories,
    } = resolver.resolve()?;

    if !cli.categories.is_empty() {
        config = config.with_allow_list(cli.categories.iter().cloned());
    }

    let files = expand_patterns(patterns)?;
    if files.is_empty() {
        return Err(LogTagError::InputMissing);
    }

    let mut lines = read_log_files(&files)?;
    if cli.sort {
        sort_lines(&mut lines);
    }

    let options = MatchOptions::new()
        .allow_list(config.allow_list.clone())
        .stop_first_tag(cli.stop_first_tag)
        .stop_first_category(cli.stop_first_category);
    let matcher = TagMatcher::new(&categories, options);

    Ok(ReportBuilder::new(&config.columns)
        .uniq(cli.uniq)
        .build(&lines, &matcher))
}

/// Run one invocation with already-parsed arguments.
pub fn execute(cli: &Cli) -> Result<(), LogTagError> {
    let report = build_report(cli)?;

    let text = match cli.format {
        OutputFormat::Text => report.to_table(),
        OutputFormat::Json => report.to_json()?,
    };

    emit_report(&text, cli.hidden, cli.out.as_deref())
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    apply_color_mode(cli.color);
    logging::init_tracing(
        cli.verbose,
        cli.quiet,
        colored::control::SHOULD_COLORIZE.should_colorize(),
    )?;

    execute(&cli)?;
    Ok(())
}
