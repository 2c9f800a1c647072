#![allow(dead_code)]

use chrono::NaiveDate;
use quantifi::domain::error::QuantifiError;
use quantifi::domain::payload::{BacktestParams, BacktestRequest};
use quantifi::domain::rule::{CompareOp, RuleUpdate, Side};
use quantifi::domain::strategy::{DataSource, StrategyUpdate};
use quantifi::domain::workspace::{RuleScope, StrategyCollection};
use quantifi::ports::request_port::RequestPort;
use std::cell::RefCell;
use std::io::Write;

/// Capturing request port, standing in for whatever carries the request to
/// the engine.
pub struct MockRequestPort {
    pub delivered: RefCell<Vec<BacktestRequest>>,
}

impl MockRequestPort {
    pub fn new() -> Self {
        Self {
            delivered: RefCell::new(Vec::new()),
        }
    }
}

impl RequestPort for MockRequestPort {
    fn deliver(&self, request: &BacktestRequest) -> Result<(), QuantifiError> {
        self.delivered.borrow_mut().push(request.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_params() -> BacktestParams {
    BacktestParams {
        symbol: "BTC-USD".into(),
        start: date(2020, 1, 1),
        end: date(2024, 10, 9),
        fees: 0.5,
        slippage: 0.1,
    }
}

/// Add an `SMA < 30` style rule to the scoped list of strategy `index`.
pub fn add_threshold_rule(
    ws: &mut StrategyCollection,
    index: usize,
    scope: RuleScope,
    indicator: &str,
    operator: CompareOp,
    value: &str,
) {
    let rules = match scope {
        RuleScope::Entry => ws.get(index).unwrap().entry_rules.len(),
        RuleScope::Exit => ws.get(index).unwrap().exit_rules.len(),
        RuleScope::RegimeEntry => ws.get(index).unwrap().regime.entry_rules.len(),
        RuleScope::RegimeExit => ws.get(index).unwrap().regime.exit_rules.len(),
    };
    ws.add_rule(index, scope);
    ws.update_rule(
        index,
        scope,
        rules,
        RuleUpdate::IndicatorName(Side::Left, indicator.into()),
    );
    ws.update_rule(index, scope, rules, RuleUpdate::Operator(operator));
    ws.update_rule(index, scope, rules, RuleUpdate::RightValue(value.into()));
}

/// A two-strategy workspace covering both sizing variants and a regime
/// filter, the shape a populated editor session saves.
pub fn sample_workspace() -> StrategyCollection {
    let mut ws = StrategyCollection::new(DataSource::Binance);

    ws.add();
    ws.update(0, StrategyUpdate::Name("Momentum".into()));
    add_threshold_rule(&mut ws, 0, RuleScope::Entry, "RSI", CompareOp::Lt, "30");
    add_threshold_rule(&mut ws, 0, RuleScope::Exit, "RSI", CompareOp::Gt, "70");

    ws.add();
    ws.update(1, StrategyUpdate::Name("Trend".into()));
    add_threshold_rule(&mut ws, 1, RuleScope::Entry, "Close", CompareOp::Gt, "100");
    ws.update(
        1,
        StrategyUpdate::SizingMethod(quantifi::domain::sizing::SizingMethod::VolatilityTarget),
    );
    ws.update(
        1,
        StrategyUpdate::RegimeAsset("BTC-USD".into()),
    );
    add_threshold_rule(&mut ws, 1, RuleScope::RegimeEntry, "SMA", CompareOp::Gt, "0");

    ws
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
