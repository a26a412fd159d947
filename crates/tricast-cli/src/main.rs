// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{NaiveDate, Utc};
use std::env;
use std::path::PathBuf;
use std::process;
use tricast_cli::{append_draw, append_history, load_draws, load_history, write_report};
use tricast_core::{DrawRecord, EnsembleConfig, TricastError};
use tricast_ensemble::{run_forecast, HistoryEntry};

struct Cli {
    command: Command,
}

enum Command {
    Forecast(ForecastArgs),
    Append(AppendArgs),
}

#[derive(Debug)]
struct ForecastArgs {
    input: PathBuf,
    history: Option<PathBuf>,
    output: Option<PathBuf>,
    coverage: Option<f64>,
    seed: Option<u64>,
}

impl Default for ForecastArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            history: None,
            output: None,
            coverage: None,
            seed: None,
        }
    }
}

#[derive(Debug)]
struct AppendArgs {
    input: PathBuf,
    date: Option<NaiveDate>,
    number: Option<u16>,
}

impl Default for AppendArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            date: None,
            number: None,
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), TricastError> {
    let Some(cli) = parse_cli_from_env()? else {
        return Ok(());
    };

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Append(args) => handle_append(args),
    }
}

fn parse_cli_from_env() -> Result<Option<Cli>, TricastError> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() || matches!(args[0].as_str(), "-h" | "--help") {
        print_root_help();
        return Ok(None);
    }
    if matches!(args[0].as_str(), "-V" | "--version") {
        print_version();
        return Ok(None);
    }

    let command_name = args[0].clone();
    let rest = &args[1..];

    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name.as_str())?;
        return Ok(None);
    }

    let command = match command_name.as_str() {
        "forecast" => Command::Forecast(parse_forecast_args(rest)?),
        "append" => Command::Append(parse_append_args(rest)?),
        _ => {
            return Err(TricastError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: forecast, append"
            )));
        }
    };

    Ok(Some(Cli { command }))
}

fn parse_forecast_args(tokens: &[String]) -> Result<ForecastArgs, TricastError> {
    let mut args = ForecastArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--history" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.history = Some(PathBuf::from(raw));
            }
            "--output" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.output = Some(PathBuf::from(raw));
            }
            "--coverage" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.coverage = Some(raw.parse::<f64>().map_err(|e| {
                    TricastError::invalid_input(format!("invalid --coverage '{raw}': {e}"))
                })?);
            }
            "--seed" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.seed = Some(raw.parse::<u64>().map_err(|e| {
                    TricastError::invalid_input(format!("invalid --seed '{raw}': {e}"))
                })?);
            }
            other => {
                return Err(TricastError::invalid_input(format!(
                    "unknown forecast option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(TricastError::invalid_input(
            "forecast requires --input <path>",
        ));
    }
    Ok(args)
}

fn parse_append_args(tokens: &[String]) -> Result<AppendArgs, TricastError> {
    let mut args = AppendArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--date" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.date = Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(
                    |e| TricastError::invalid_input(format!("invalid --date '{raw}': {e}")),
                )?);
            }
            "--number" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                if raw.len() != 3 || !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(TricastError::invalid_input(format!(
                        "invalid --number '{raw}': expected exactly three digits"
                    )));
                }
                args.number = Some(raw.parse::<u16>().map_err(|e| {
                    TricastError::invalid_input(format!("invalid --number '{raw}': {e}"))
                })?);
            }
            other => {
                return Err(TricastError::invalid_input(format!(
                    "unknown append option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(TricastError::invalid_input("append requires --input <path>"));
    }
    if args.date.is_none() || args.number.is_none() {
        return Err(TricastError::invalid_input(
            "append requires --date <YYYY-MM-DD> and --number <NNN>",
        ));
    }
    Ok(args)
}

fn handle_forecast(args: ForecastArgs) -> Result<(), TricastError> {
    let draws = load_draws(&args.input)?;
    let history = match &args.history {
        Some(path) => Some(load_history(path)?),
        None => None,
    };

    let mut config = EnsembleConfig::default();
    if let Some(coverage) = args.coverage {
        config.target_coverage = coverage;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let report = run_forecast(&draws, history.as_ref(), &config, Utc::now())?;

    match &args.output {
        Some(path) => {
            write_report(path, &report)?;
            log::info!("report written to {}", path.display());
        }
        None => {
            let encoded = serde_json::to_string_pretty(&report)
                .map_err(|e| TricastError::parse(format!("encoding report: {e}")))?;
            println!("{encoded}");
        }
    }

    // History is appended only after the pass has fully completed.
    if let Some(path) = &args.history {
        let appended = append_history(
            path,
            HistoryEntry {
                timestamp: report.timestamp,
                methods: report.methods.clone(),
            },
        )?;
        log::info!("history log now holds {appended} entries");
    }

    Ok(())
}

fn handle_append(args: AppendArgs) -> Result<(), TricastError> {
    let (Some(date), Some(number)) = (args.date, args.number) else {
        return Err(TricastError::invalid_input(
            "append requires --date <YYYY-MM-DD> and --number <NNN>",
        ));
    };
    let record = DrawRecord::new(date, number)?;
    let total = append_draw(&args.input, record)?;
    println!("{} now holds {total} draws", args.input.display());
    Ok(())
}

fn split_flag(token: &str) -> Result<(&str, Option<String>), TricastError> {
    if !token.starts_with("--") {
        return Err(TricastError::invalid_input(format!(
            "unexpected positional argument '{token}'; expected --flag value"
        )));
    }
    if let Some((flag, value)) = token.split_once('=') {
        return Ok((flag, Some(value.to_string())));
    }
    Ok((token, None))
}

fn take_flag_value(
    flag: &str,
    inline_value: Option<String>,
    tokens: &[String],
    idx: &mut usize,
) -> Result<String, TricastError> {
    if let Some(value) = inline_value {
        return Ok(value);
    }

    *idx += 1;
    let value = tokens
        .get(*idx)
        .ok_or_else(|| TricastError::invalid_input(format!("{flag} requires a value")))?;
    if value.starts_with("--") {
        return Err(TricastError::invalid_input(format!(
            "{flag} requires a value, but got option '{value}'"
        )));
    }
    Ok(value.clone())
}

fn print_version() {
    println!("tricast {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "tricast {}\n\nUSAGE:\n  tricast <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  forecast  Run the ensemble forecast over a draw history file\n  append    Append one draw record to a history file\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nRun 'tricast <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), TricastError> {
    match command {
        "forecast" => {
            println!(
                "tricast forecast\n\nRun the ensemble forecast over a draw history file.\n\nUSAGE:\n  tricast forecast --input <path> [OPTIONS]\n\nOPTIONS:\n  --input <path>      Draw history (JSON array or date,number CSV)\n  --history <path>    Prediction-history log (read for calibration,\n                      appended after the run)\n  --output <path>     Write the report JSON here instead of stdout\n  --coverage <float>  Conformal target coverage (default 0.9)\n  --seed <u64>        RNG seed for stochastic methods (default 42)"
            );
            Ok(())
        }
        "append" => {
            println!(
                "tricast append\n\nAppend one draw record to a history file.\n\nUSAGE:\n  tricast append --input <path> --date <YYYY-MM-DD> --number <NNN>"
            );
            Ok(())
        }
        other => Err(TricastError::invalid_input(format!(
            "unknown command '{other}'; expected one of: forecast, append"
        ))),
    }
}
