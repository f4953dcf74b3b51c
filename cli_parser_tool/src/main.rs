//! # cli-parse
//!
//! Parses one management console line and prints the result as JSON.

use clap::{Parser, ValueEnum};
use cli_parser::config::RuntimeConfig;
use cli_parser::logging::{self, codes, LogCrateLogger, LoggingService};
use cli_parser::parsing::{self, ParseError, ParserOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Address, operation name, arguments, headers and redirect
    Command,
    /// Bare `name=value` argument list
    Arguments,
    /// Address path only
    Address,
    /// Rollout plan header value
    Rollout,
}

#[derive(Parser, Debug)]
#[command(name = "cli-parse")]
#[command(version, about = "Parse management console command lines")]
struct Args {
    /// Text to parse
    text: String,

    /// Grammar to parse the text with
    #[arg(short, long, value_enum, default_value_t = Mode::Command)]
    mode: Mode,

    /// Treat `\` literally in names and values
    #[arg(long)]
    no_value_escaping: bool,

    /// Treat `\` literally inside quoted spans
    #[arg(long)]
    no_quote_escaping: bool,

    /// TOML file with parser and logging preferences
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the rollout plan as an operation header model
    #[arg(long)]
    model: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, String> {
    let config = match &args.config {
        Some(path) => RuntimeConfig::load(path).map_err(|e| format!("Error: {}", e))?,
        None => RuntimeConfig::default(),
    };

    let service = logging_service(args, &config);
    logging::init_global_logging_with_service(Arc::new(service)).map_err(|e| {
        format!("error[{}]: {}", codes::system::INITIALIZATION_FAILURE, e)
    })?;

    let mut options = ParserOptions::from_preferences(&config.parser);
    if args.no_value_escaping {
        options.value_escaping = false;
    }
    if args.no_quote_escaping {
        options.escape_in_quotes = false;
    }

    let json = match args.mode {
        Mode::Command => to_json(&parsing::parse_command_line(&args.text, &options)),
        Mode::Arguments => to_json(&parsing::parse_arguments(&args.text, &options)),
        Mode::Address => to_json(&parsing::parse_address(&args.text, None, &options)),
        Mode::Rollout => {
            let header = parsing::parse_rollout_plan(&args.text, &options).map_err(describe)?;
            if args.model {
                match header.to_model() {
                    Some(model) => serde_json::to_string_pretty(&model).map_err(|e| e.to_string()),
                    None => Err(format!(
                        "Error: plan reference '{}' has no inline model",
                        header.plan_ref.as_deref().unwrap_or_default()
                    )),
                }
            } else {
                to_json(&Ok(header))
            }
        }
    }?;
    Ok(json)
}

/// A config file picks the console or structured logger; without one,
/// events go through `log` and `RUST_LOG` filters them
fn logging_service(args: &Args, config: &RuntimeConfig) -> LoggingService {
    match &args.config {
        Some(_) => LoggingService::with_preferences(&config.logging),
        None => LoggingService::new(
            Arc::new(LogCrateLogger),
            config.logging.min_log_level.to_events_log_level(),
        ),
    }
}

fn to_json<T: serde::Serialize>(result: &Result<T, ParseError>) -> Result<String, String> {
    match result {
        Ok(value) => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        Err(error) => Err(describe(error.clone())),
    }
}

/// `error[E022]: message (offset 4)`
fn describe(error: ParseError) -> String {
    match error.offset() {
        Some(offset) => format!("error[{}]: {} (offset {})", error.error_code(), error, offset),
        None => format!("error[{}]: {}", error.error_code(), error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_description_carries_code_and_offset() {
        let error = ParseError::missing_argument_value("name", 4);
        assert_eq!(
            describe(error),
            "error[E022]: Argument 'name' is missing value at offset 4. (offset 4)"
        );
        assert_eq!(describe(ParseError::EmptyInput), "error[E001]: Input is empty.");
    }

    #[test]
    fn test_arguments_parse_from_flags() {
        let args = Args::parse_from(["cli-parse", "--mode", "rollout", "--model", "{a}"]);
        assert_eq!(args.mode, Mode::Rollout);
        assert!(args.model);
        assert_eq!(args.text, "{a}");
    }

    #[test]
    fn test_config_file_preferences_drive_logging() {
        let args = Args::parse_from(["cli-parse", "--config", "parser.toml", ":op"]);
        let config = RuntimeConfig::from_toml_str(
            r#"
            [logging]
            use_structured_logging = true
            min_log_level = "debug"
            "#,
        )
        .unwrap();

        let service = logging_service(&args, &config);
        assert_eq!(service.min_level(), logging::LogLevel::Debug);
    }
}
