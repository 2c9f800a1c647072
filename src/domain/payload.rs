//! Wire payload for the backtest engine.
//!
//! The canonical request shape the engine consumes. Serialization is the
//! one place the editor model is normalized: UI bookkeeping disappears,
//! lazy parameter defaults are applied, and only the active sizing
//! variant's fields survive. Field names are the engine contract verbatim,
//! mixed casing included.

use crate::domain::catalog::IndicatorCatalog;
use crate::domain::indicator::{IndicatorKind, IndicatorSpec, DEFAULT_SERIES};
use crate::domain::regime::RegimeAction;
use crate::domain::rule::{CompareOp, LogicalOp, Rule, RuleSet};
use crate::domain::sizing::{PositionSizing, SizingMethod};
use crate::domain::strategy::{DataSource, Direction, Frequency, Strategy};
use crate::domain::workspace::StrategyCollection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPayload {
    #[serde(rename = "type")]
    pub kind: IndicatorKind,
    pub name: String,
    pub params: BTreeMap<String, String>,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePayload {
    pub operator: CompareOp,
    #[serde(rename = "useRightIndicator")]
    pub use_right_indicator: bool,
    #[serde(rename = "rightValue")]
    pub right_value: String,
    #[serde(rename = "logicalOperator")]
    pub logical_operator: LogicalOp,
    #[serde(rename = "leftIndicator")]
    pub left_indicator: IndicatorPayload,
    #[serde(rename = "rightIndicator")]
    pub right_indicator: Option<IndicatorPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPayload {
    pub name: String,
    pub allocation: f64,
    #[serde(rename = "positionType")]
    pub position_type: Direction,
    #[serde(rename = "entryRules")]
    pub entry_rules: Vec<RulePayload>,
    #[serde(rename = "exitRules")]
    pub exit_rules: Vec<RulePayload>,
    #[serde(rename = "entryRegimeRules")]
    pub entry_regime_rules: Vec<RulePayload>,
    #[serde(rename = "exitRegimeRules")]
    pub exit_regime_rules: Vec<RulePayload>,
    #[serde(rename = "regimeEntryAction")]
    pub regime_entry_action: Option<RegimeAction>,
    #[serde(rename = "regimeExitAction")]
    pub regime_exit_action: Option<RegimeAction>,
    #[serde(rename = "regimeAsset")]
    pub regime_asset: String,
    pub active: bool,
    pub position_size_method: SizingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_position_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility_buffer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility_lookback: Option<u32>,
    pub max_leverage: f64,
    pub frequency: Frequency,
}

/// Caller-supplied run parameters bundled around the strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestParams {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub fees: f64,
    pub slippage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub symbol: String,
    pub data_source: DataSource,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub fees: f64,
    pub slippage: f64,
    pub strategies: Vec<StrategyPayload>,
}

impl BacktestRequest {
    /// Bundle the run parameters with every strategy in the workspace,
    /// serialized against `catalog`.
    pub fn assemble(
        params: &BacktestParams,
        workspace: &StrategyCollection,
        catalog: &IndicatorCatalog,
    ) -> Self {
        Self {
            symbol: params.symbol.clone(),
            data_source: workspace.data_source(),
            start: params.start,
            end: params.end,
            fees: params.fees,
            slippage: params.slippage,
            strategies: workspace
                .strategies()
                .iter()
                .map(|s| strategy_payload(s, catalog))
                .collect(),
        }
    }
}

/// Reduce an indicator reference to the four-field wire shape. All fields
/// are always present; the ones the `type` does not use stay empty. This
/// is the read point where an unset `series` parameter becomes `"Close"`.
pub fn indicator_payload(spec: &IndicatorSpec, catalog: &IndicatorCatalog) -> IndicatorPayload {
    match spec.kind {
        IndicatorKind::Composite => IndicatorPayload {
            kind: IndicatorKind::Composite,
            name: String::new(),
            params: BTreeMap::new(),
            expression: spec.expression.clone(),
        },
        IndicatorKind::Simple => {
            let mut params = spec.params.clone();
            for declared in catalog.params_for(&spec.name) {
                params.entry(declared.clone()).or_default();
            }
            if let Some(series) = params.get_mut("series") {
                if series.is_empty() {
                    *series = DEFAULT_SERIES.to_string();
                }
            }
            IndicatorPayload {
                kind: IndicatorKind::Simple,
                name: spec.name.clone(),
                params,
                expression: String::new(),
            }
        }
    }
}

pub fn rule_payload(rule: &Rule, catalog: &IndicatorCatalog) -> RulePayload {
    RulePayload {
        operator: rule.operator,
        use_right_indicator: rule.use_right_indicator,
        right_value: rule.right_value.clone(),
        logical_operator: rule.connector,
        left_indicator: indicator_payload(&rule.left, catalog),
        right_indicator: rule
            .use_right_indicator
            .then(|| indicator_payload(&rule.right, catalog)),
    }
}

fn rules_payload(rules: &RuleSet, catalog: &IndicatorCatalog) -> Vec<RulePayload> {
    rules
        .rules()
        .iter()
        .map(|rule| rule_payload(rule, catalog))
        .collect()
}

/// Reduce one strategy to its wire shape. Pure and total: malformed editor
/// state still produces a payload for the engine to judge.
pub fn strategy_payload(strategy: &Strategy, catalog: &IndicatorCatalog) -> StrategyPayload {
    let (fixed, target, buffer, lookback) = match strategy.sizing {
        PositionSizing::Fixed { fraction } => (Some(fraction), None, None, None),
        PositionSizing::VolatilityTarget {
            target,
            buffer,
            lookback_days,
            ..
        } => (None, Some(target), Some(buffer), Some(lookback_days)),
    };

    StrategyPayload {
        name: strategy.name.clone(),
        allocation: strategy.allocation,
        position_type: strategy.direction,
        entry_rules: rules_payload(&strategy.entry_rules, catalog),
        exit_rules: rules_payload(&strategy.exit_rules, catalog),
        entry_regime_rules: rules_payload(&strategy.regime.entry_rules, catalog),
        exit_regime_rules: rules_payload(&strategy.regime.exit_rules, catalog),
        regime_entry_action: strategy.regime.entry_action,
        regime_exit_action: strategy.regime.exit_action,
        regime_asset: strategy.regime.asset.clone(),
        active: strategy.active,
        position_size_method: strategy.sizing.method(),
        fixed_position_size: fixed,
        volatility_target: target,
        volatility_buffer: buffer,
        volatility_lookback: lookback,
        max_leverage: strategy.sizing.effective_max_leverage(),
        frequency: strategy.frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::regime::RegimeScope;
    use crate::domain::rule::{RuleUpdate, Side};
    use crate::domain::sizing::SizingMethod;
    use crate::domain::strategy::StrategyUpdate;
    use crate::domain::workspace::RuleScope;
    use serde_json::{json, Value};

    fn catalog() -> IndicatorCatalog {
        IndicatorCatalog::builtin()
    }

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn simple_indicator_reduces_with_series_default() {
        let spec = IndicatorSpec::simple("SMA", &[("window", "20")]);
        let payload = indicator_payload(&spec, &catalog());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "type": "simple",
                "name": "SMA",
                "params": {"series": "Close", "window": "20"},
                "expression": "",
            })
        );
    }

    #[test]
    fn composite_indicator_reduces_to_expression_only() {
        let spec = IndicatorSpec::composite("max(SMA(Close,20), EMA(Close,50))");
        let payload = indicator_payload(&spec, &catalog());
        assert_eq!(payload.kind, IndicatorKind::Composite);
        assert!(payload.name.is_empty());
        assert!(payload.params.is_empty());
        assert_eq!(payload.expression, "max(SMA(Close,20), EMA(Close,50))");
    }

    #[test]
    fn unknown_indicator_degrades_to_stored_params() {
        let spec = IndicatorSpec::simple("MACD", &[("fast", "12")]);
        let payload = indicator_payload(&spec, &catalog());
        assert_eq!(payload.name, "MACD");
        assert_eq!(payload.params.get("fast").unwrap(), "12");
        assert_eq!(payload.params.len(), 1);
    }

    #[test]
    fn literal_rule_serializes_a_null_right_indicator() {
        let rules = RuleSet::default()
            .push_default()
            .update(0, RuleUpdate::IndicatorName(Side::Left, "RSI".into()))
            .update(0, RuleUpdate::RightValue("30".into()));
        let payload = rule_payload(rules.get(0).unwrap(), &catalog());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["rightIndicator"], Value::Null);
        assert_eq!(value["rightValue"], "30");
        assert_eq!(value["operator"], "<");
        assert_eq!(value["logicalOperator"], "and");
    }

    #[test]
    fn rule_order_and_connectors_survive_serialization() {
        let rules = RuleSet::default()
            .push_default()
            .push_default()
            .update(1, RuleUpdate::Operator(CompareOp::Gt))
            .update(1, RuleUpdate::Connector(LogicalOp::Or));
        let payloads = rules_payload(&rules, &catalog());
        assert_eq!(payloads[0].operator, CompareOp::Lt);
        assert_eq!(payloads[0].logical_operator, LogicalOp::And);
        assert_eq!(payloads[1].operator, CompareOp::Gt);
        assert_eq!(payloads[1].logical_operator, LogicalOp::Or);
    }

    fn one_strategy_workspace() -> StrategyCollection {
        let mut ws = StrategyCollection::new(DataSource::Binance);
        ws.add();
        ws
    }

    #[test]
    fn fixed_sizing_omits_volatility_keys() {
        let ws = one_strategy_workspace();
        let payload = strategy_payload(ws.get(0).unwrap(), &catalog());
        let value = serde_json::to_value(&payload).unwrap();
        let keys = keys(&value);
        assert!(keys.contains(&"fixed_position_size"));
        assert!(!keys.contains(&"volatility_target"));
        assert!(!keys.contains(&"volatility_buffer"));
        assert!(!keys.contains(&"volatility_lookback"));
        assert_eq!(value["position_size_method"], "fixed");
        assert_eq!(value["fixed_position_size"], 1.0);
        assert_eq!(value["max_leverage"], 1.0);
    }

    #[test]
    fn volatility_sizing_omits_the_fixed_key() {
        let mut ws = one_strategy_workspace();
        ws.update(0, StrategyUpdate::SizingMethod(SizingMethod::VolatilityTarget));
        let payload = strategy_payload(ws.get(0).unwrap(), &catalog());
        let value = serde_json::to_value(&payload).unwrap();
        let keys = keys(&value);
        assert!(!keys.contains(&"fixed_position_size"));
        assert_eq!(value["position_size_method"], "volatility_target");
        assert_eq!(value["volatility_target"], 10.0);
        assert_eq!(value["volatility_buffer"], 5.0);
        assert_eq!(value["volatility_lookback"], 30);
        assert_eq!(value["max_leverage"], 3.0);
    }

    #[test]
    fn collapse_flags_never_reach_the_wire() {
        let mut ws = one_strategy_workspace();
        ws.update(0, StrategyUpdate::Collapsed(true));
        ws.update(0, StrategyUpdate::EntryRulesCollapsed(true));
        let value =
            serde_json::to_value(strategy_payload(ws.get(0).unwrap(), &catalog())).unwrap();
        for key in keys(&value) {
            assert!(
                !key.to_lowercase().contains("collapsed"),
                "leaked UI field {key}"
            );
        }
    }

    #[test]
    fn regime_rules_serialize_even_without_actions() {
        let mut ws = one_strategy_workspace();
        ws.add_rule(0, RuleScope::RegimeEntry);
        ws.add_rule(0, RuleScope::RegimeExit);
        let payload = strategy_payload(ws.get(0).unwrap(), &catalog());
        assert_eq!(payload.regime_entry_action, None);
        assert_eq!(payload.regime_exit_action, None);
        assert_eq!(payload.entry_regime_rules.len(), 1);
        assert_eq!(payload.exit_regime_rules.len(), 1);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["regimeEntryAction"], Value::Null);
        assert!(value["entryRegimeRules"].is_array());
    }

    #[test]
    fn regime_action_serializes_its_direction() {
        let mut ws = one_strategy_workspace();
        ws.update(
            0,
            StrategyUpdate::RegimeAction(RegimeScope::Entry, Some(RegimeAction::Long)),
        );
        ws.update(0, StrategyUpdate::RegimeAsset("BTC-USD".into()));
        let value =
            serde_json::to_value(strategy_payload(ws.get(0).unwrap(), &catalog())).unwrap();
        assert_eq!(value["regimeEntryAction"], "long");
        assert_eq!(value["regimeAsset"], "BTC-USD");
    }

    #[test]
    fn request_bundles_params_source_and_strategies() {
        let ws = one_strategy_workspace();
        let params = BacktestParams {
            symbol: "BTC-USD".into(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 10, 9).unwrap(),
            fees: 0.5,
            slippage: 0.1,
        };
        let request = BacktestRequest::assemble(&params, &ws, &catalog());
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["symbol"], "BTC-USD");
        assert_eq!(value["data_source"], "Binance");
        assert_eq!(value["start"], "2020-01-01");
        assert_eq!(value["end"], "2024-10-09");
        assert_eq!(value["fees"], 0.5);
        assert_eq!(value["slippage"], 0.1);
        assert_eq!(value["strategies"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn serialization_is_deterministic() {
        let mut ws = one_strategy_workspace();
        ws.add_rule(0, RuleScope::Entry);
        ws.update_rule(
            0,
            RuleScope::Entry,
            0,
            RuleUpdate::IndicatorName(Side::Left, "SMA".into()),
        );
        let first = serde_json::to_string(&strategy_payload(ws.get(0).unwrap(), &catalog())).unwrap();
        let second = serde_json::to_string(&strategy_payload(ws.get(0).unwrap(), &catalog())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn payload_round_trips_through_json() {
        let mut ws = one_strategy_workspace();
        ws.update(0, StrategyUpdate::SizingMethod(SizingMethod::VolatilityTarget));
        ws.add_rule(0, RuleScope::Entry);
        let payload = strategy_payload(ws.get(0).unwrap(), &catalog());
        let text = serde_json::to_string(&payload).unwrap();
        let back: StrategyPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back, payload);
    }
}
