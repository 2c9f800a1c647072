//! Configuration validation and strategy lints.
//!
//! Two different strictness levels on purpose. Run parameters (symbol,
//! dates, fees) come from the operator and fail hard before an export.
//! Strategy content comes from the visual editor and never fails, because
//! the engine is the judge of meaning; problems there surface as lints a
//! caller may print or ignore.

use crate::domain::catalog::IndicatorCatalog;
use crate::domain::error::QuantifiError;
use crate::domain::indicator::{IndicatorKind, IndicatorSpec};
use crate::domain::rule::RuleSet;
use crate::domain::strategy::DataSource;
use crate::domain::workspace::StrategyCollection;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_lab_config(config: &dyn ConfigPort) -> Result<(), QuantifiError> {
    validate_symbol(config)?;
    validate_dates(config)?;
    validate_fees(config)?;
    validate_slippage(config)?;
    validate_data_source(config)?;
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), QuantifiError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(QuantifiError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), QuantifiError> {
    let start = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start >= end {
        return Err(QuantifiError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, QuantifiError> {
    match value {
        None => Err(QuantifiError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| QuantifiError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_fees(config: &dyn ConfigPort) -> Result<(), QuantifiError> {
    let value = config.get_double("backtest", "fees", 0.0);
    if value < 0.0 {
        return Err(QuantifiError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "fees".to_string(),
            reason: "fees must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_slippage(config: &dyn ConfigPort) -> Result<(), QuantifiError> {
    let value = config.get_double("backtest", "slippage", 0.0);
    if value < 0.0 {
        return Err(QuantifiError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "slippage".to_string(),
            reason: "slippage must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), QuantifiError> {
    match config.get_string("backtest", "data_source") {
        None => Ok(()),
        Some(s) if DataSource::parse(&s).is_some() => Ok(()),
        Some(s) => Err(QuantifiError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "data_source".to_string(),
            reason: format!("unknown data source '{}'", s),
        }),
    }
}

/// One non-fatal finding about a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lint {
    pub strategy: usize,
    pub message: String,
}

impl Lint {
    fn new(strategy: usize, message: String) -> Self {
        Self { strategy, message }
    }
}

/// Inspect every strategy for content the engine is likely to reject.
/// Findings never block serialization.
pub fn lint_strategies(workspace: &StrategyCollection, catalog: &IndicatorCatalog) -> Vec<Lint> {
    let mut lints = Vec::new();

    for (index, strategy) in workspace.strategies().iter().enumerate() {
        if !(strategy.allocation > 0.0 && strategy.allocation <= 100.0) {
            lints.push(Lint::new(
                index,
                format!("allocation {} is outside (0, 100]", strategy.allocation),
            ));
        }
        if strategy.active && strategy.entry_rules.is_empty() {
            lints.push(Lint::new(index, "active strategy has no entry rules".to_string()));
        }
        if !workspace.data_source().allows(strategy.frequency) {
            lints.push(Lint::new(
                index,
                format!(
                    "frequency {} is not available on {}",
                    strategy.frequency,
                    workspace.data_source()
                ),
            ));
        }

        lint_rules(&mut lints, index, "entry rule", &strategy.entry_rules, catalog);
        lint_rules(&mut lints, index, "exit rule", &strategy.exit_rules, catalog);
        lint_rules(
            &mut lints,
            index,
            "entry regime rule",
            &strategy.regime.entry_rules,
            catalog,
        );
        lint_rules(
            &mut lints,
            index,
            "exit regime rule",
            &strategy.regime.exit_rules,
            catalog,
        );
    }

    lints
}

fn lint_rules(
    lints: &mut Vec<Lint>,
    strategy: usize,
    scope: &str,
    rules: &RuleSet,
    catalog: &IndicatorCatalog,
) {
    for (index, rule) in rules.rules().iter().enumerate() {
        lint_side(lints, strategy, scope, index, "left", &rule.left, catalog);
        if rule.use_right_indicator {
            lint_side(lints, strategy, scope, index, "right", &rule.right, catalog);
        } else if rule.right_value.trim().is_empty() {
            lints.push(Lint::new(
                strategy,
                format!("{scope} {index}: missing comparison value"),
            ));
        } else if rule.right_value.trim().parse::<f64>().is_err() {
            lints.push(Lint::new(
                strategy,
                format!(
                    "{scope} {index}: comparison value '{}' is not numeric",
                    rule.right_value
                ),
            ));
        }
    }
}

fn lint_side(
    lints: &mut Vec<Lint>,
    strategy: usize,
    scope: &str,
    index: usize,
    side: &str,
    spec: &IndicatorSpec,
    catalog: &IndicatorCatalog,
) {
    match spec.kind {
        IndicatorKind::Simple => {
            if spec.name.is_empty() {
                lints.push(Lint::new(
                    strategy,
                    format!("{scope} {index}: {side} indicator not selected"),
                ));
            } else if !catalog.contains(&spec.name) {
                lints.push(Lint::new(
                    strategy,
                    format!("{scope} {index}: unknown indicator '{}'", spec.name),
                ));
            }
        }
        IndicatorKind::Composite => {
            if spec.expression.trim().is_empty() {
                lints.push(Lint::new(
                    strategy,
                    format!("{scope} {index}: {side} composite expression is empty"),
                ));
            }
        }
    }
}
