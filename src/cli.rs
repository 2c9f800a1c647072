//! CLI definition and dispatch.
//!
//! Diagnostics go to stderr; payloads and listings go to stdout. Exit
//! codes: 0 success, 1 io, 2 config, 3 workspace, 4 malformed JSON,
//! 5 validation findings.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_request_adapter::JsonRequestAdapter;
use crate::domain::catalog::IndicatorCatalog;
use crate::domain::error::QuantifiError;
use crate::domain::expression::ExpressionStack;
use crate::domain::payload::{BacktestParams, BacktestRequest};
use crate::domain::strategy::DataSource;
use crate::domain::validation::{lint_strategies, validate_lab_config};
use crate::domain::workspace::StrategyCollection;
use crate::ports::config_port::ConfigPort;
use crate::ports::request_port::RequestPort;

#[derive(Parser, Debug)]
#[command(name = "quantifi", about = "Strategy compiler for the QuantiFi backtest engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a strategy workspace into a backtest request
    Export {
        #[arg(short, long)]
        strategies: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        fees: Option<f64>,
        #[arg(long)]
        slippage: Option<f64>,
    },
    /// Check a workspace for content the engine would reject
    Validate {
        #[arg(short, long)]
        strategies: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compile a composite-indicator expression stack to its expression
    Compile {
        #[arg(short = 'k', long)]
        stack: PathBuf,
    },
    /// List the indicator catalog
    Catalog {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Export {
            strategies,
            config,
            output,
            symbol,
            source,
            start,
            end,
            fees,
            slippage,
        } => run_export(ExportArgs {
            strategies,
            config,
            output,
            symbol,
            source,
            start,
            end,
            fees,
            slippage,
        }),
        Command::Validate { strategies, config } => run_validate(&strategies, config.as_ref()),
        Command::Compile { stack } => run_compile(&stack),
        Command::Catalog { config } => run_catalog(config.as_ref()),
    }
}

pub struct ExportArgs {
    pub strategies: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub symbol: Option<String>,
    pub source: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub fees: Option<f64>,
    pub slippage: Option<f64>,
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = QuantifiError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn load_workspace(path: &PathBuf) -> Result<StrategyCollection, QuantifiError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| QuantifiError::Workspace {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Merge run parameters from config and command-line overrides. Overrides
/// win; anything still missing or out of range is a config error.
pub fn build_params(
    config: &dyn ConfigPort,
    args: &ExportArgs,
) -> Result<BacktestParams, QuantifiError> {
    let symbol = args
        .symbol
        .clone()
        .or_else(|| config.get_string("backtest", "symbol"))
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| QuantifiError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })?;

    let start = resolve_date(config, args.start, "start_date")?;
    let end = resolve_date(config, args.end, "end_date")?;
    if start >= end {
        return Err(QuantifiError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "start_date must be before end_date".into(),
        });
    }

    let fees = args
        .fees
        .unwrap_or_else(|| config.get_double("backtest", "fees", 0.0));
    if fees < 0.0 {
        return Err(QuantifiError::ConfigInvalid {
            section: "backtest".into(),
            key: "fees".into(),
            reason: "fees must be non-negative".into(),
        });
    }

    let slippage = args
        .slippage
        .unwrap_or_else(|| config.get_double("backtest", "slippage", 0.0));
    if slippage < 0.0 {
        return Err(QuantifiError::ConfigInvalid {
            section: "backtest".into(),
            key: "slippage".into(),
            reason: "slippage must be non-negative".into(),
        });
    }

    Ok(BacktestParams {
        symbol,
        start,
        end,
        fees,
        slippage,
    })
}

fn resolve_date(
    config: &dyn ConfigPort,
    override_value: Option<NaiveDate>,
    key: &str,
) -> Result<NaiveDate, QuantifiError> {
    if let Some(date) = override_value {
        return Ok(date);
    }
    let text = config
        .get_string("backtest", key)
        .ok_or_else(|| QuantifiError::ConfigMissing {
            section: "backtest".into(),
            key: key.into(),
        })?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| QuantifiError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: format!("invalid {} format, expected YYYY-MM-DD", key),
    })
}

fn run_export(args: ExportArgs) -> ExitCode {
    let adapter = match load_config(args.config.as_ref()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    eprintln!("Loading workspace from {}", args.strategies.display());
    let mut workspace = match load_workspace(&args.strategies) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Some(source) = args.source.as_deref() {
        match DataSource::parse(source) {
            Some(source) => workspace.set_data_source(source),
            None => {
                let err = QuantifiError::ConfigInvalid {
                    section: "backtest".into(),
                    key: "data_source".into(),
                    reason: format!("unknown data source '{}'", source),
                };
                eprintln!("error: {err}");
                return (&err).into();
            }
        }
    }

    let params = match build_params(&adapter, &args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let catalog = IndicatorCatalog::from_config(&adapter);
    for lint in lint_strategies(&workspace, &catalog) {
        eprintln!("warning: strategy {}: {}", lint.strategy, lint.message);
    }

    eprintln!(
        "Compiling {} strategies for {} on {}",
        workspace.len(),
        params.symbol,
        workspace.data_source(),
    );

    let request = BacktestRequest::assemble(&params, &workspace, &catalog);
    let port = match args.output.clone() {
        Some(path) => JsonRequestAdapter::to_file(path),
        None => JsonRequestAdapter::to_stdout(),
    };

    match port.deliver(&request) {
        Ok(()) => {
            if let Some(path) = &args.output {
                eprintln!("Request written to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(strategies_path: &PathBuf, config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if config_path.is_some() {
        if let Err(e) = validate_lab_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("Validating workspace: {}", strategies_path.display());
    let workspace = match load_workspace(strategies_path) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for (index, strategy) in workspace.strategies().iter().enumerate() {
        eprintln!("\nStrategy {}: {}", index + 1, strategy.name);
        if !strategy.entry_rules.is_empty() {
            eprintln!("  entry: {}", strategy.entry_rules.summary());
        }
        if !strategy.exit_rules.is_empty() {
            eprintln!("  exit:  {}", strategy.exit_rules.summary());
        }
    }

    let catalog = IndicatorCatalog::from_config(&adapter);
    let lints = lint_strategies(&workspace, &catalog);
    if lints.is_empty() {
        eprintln!("\nWorkspace is valid.");
        return ExitCode::SUCCESS;
    }

    eprintln!();
    for lint in &lints {
        eprintln!("warning: strategy {}: {}", lint.strategy, lint.message);
    }
    eprintln!("{} issues found", lints.len());
    ExitCode::from(5)
}

fn run_compile(stack_path: &PathBuf) -> ExitCode {
    let text = match fs::read_to_string(stack_path) {
        Ok(t) => t,
        Err(e) => {
            let err = QuantifiError::from(e);
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    let stack: ExpressionStack = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            let err = QuantifiError::from(e);
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    println!("{}", stack.compile());
    ExitCode::SUCCESS
}

fn run_catalog(config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let catalog = IndicatorCatalog::from_config(&adapter);
    for entry in catalog.entries() {
        if entry.params.is_empty() {
            println!("{}", entry.name);
        } else {
            println!("{}({})", entry.name, entry.params.join(", "));
        }
    }
    eprintln!("{} indicators", catalog.entries().len());
    ExitCode::SUCCESS
}
