//! Release validation CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;
use varqc_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg, ReportLevelArg};
use varqc_cli::commands::{run_header, run_missingness, run_stages, run_validate};
use varqc_cli::logging::{LogConfig, LogFormat, init_logging};
use varqc_cli::summary::{missingness_table, print_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Validate(args) => match run_validate(&args) {
            Ok(result) => {
                print_summary(&result);
                if args.fail_on_findings && result.summary.has_findings() {
                    1
                } else {
                    0
                }
            }
            Err(error) => report_error(&error),
        },
        Command::Missingness(args) => match run_missingness(&args) {
            Ok(report) => {
                println!("{}", missingness_table(&report, false));
                0
            }
            Err(error) => report_error(&error),
        },
        Command::Header(args) => match run_header(&args) {
            Ok(true) => 0,
            Ok(false) => 1,
            Err(error) => report_error(&error),
        },
        Command::Stages(args) => match run_stages(&args) {
            Ok(()) => 0,
            Err(error) => report_error(&error),
        },
    };
    std::process::exit(exit_code);
}

fn report_error(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.report_level = match cli.report_level {
        ReportLevelArg::Off => LevelFilter::OFF,
        ReportLevelArg::Error => LevelFilter::ERROR,
        ReportLevelArg::Warn => LevelFilter::WARN,
        ReportLevelArg::Info => LevelFilter::INFO,
    };
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
