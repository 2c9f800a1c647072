//! Strategy aggregate.
//!
//! One named configuration unit: rules, regime filter, sizing, allocation,
//! frequency. Also owns the data-source/frequency policy: a daily-only
//! source admits only daily bars, and frequencies that stop being allowed
//! are silently reset to the first allowed value.

use crate::domain::regime::{RegimeAction, RegimeFilter, RegimeScope};
use crate::domain::rule::RuleSet;
use crate::domain::sizing::{PositionSizing, SizingMethod};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    #[serde(rename = "Yahoo Finance")]
    YahooFinance,
    Binance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "10m")]
    M10,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "1m")]
    M1,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::H4 => "4h",
            Frequency::H1 => "1h",
            Frequency::M30 => "30m",
            Frequency::M15 => "15m",
            Frequency::M10 => "10m",
            Frequency::M5 => "5m",
            Frequency::M1 => "1m",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DAILY_ONLY: &[Frequency] = &[Frequency::Daily];
const INTRADAY: &[Frequency] = &[
    Frequency::Daily,
    Frequency::H4,
    Frequency::H1,
    Frequency::M30,
    Frequency::M15,
    Frequency::M10,
    Frequency::M5,
    Frequency::M1,
];

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::YahooFinance => "Yahoo Finance",
            DataSource::Binance => "Binance",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Yahoo Finance" => Some(DataSource::YahooFinance),
            "Binance" => Some(DataSource::Binance),
            _ => None,
        }
    }

    pub fn allowed_frequencies(self) -> &'static [Frequency] {
        match self {
            DataSource::YahooFinance => DAILY_ONLY,
            DataSource::Binance => INTRADAY,
        }
    }

    pub fn first_allowed(self) -> Frequency {
        self.allowed_frequencies()[0]
    }

    pub fn allows(self, frequency: Frequency) -> bool {
        self.allowed_frequencies().contains(&frequency)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub name: String,
    pub allocation: f64,
    #[serde(rename = "positionType")]
    pub direction: Direction,
    #[serde(default)]
    pub entry_rules: RuleSet,
    #[serde(default)]
    pub exit_rules: RuleSet,
    #[serde(rename = "regimeFilter", default)]
    pub regime: RegimeFilter,
    #[serde(rename = "positionSizing", default)]
    pub sizing: PositionSizing,
    pub frequency: Frequency,
    #[serde(default = "default_active")]
    pub active: bool,
    // UI bookkeeping: round-tripped through the workspace file, never
    // serialized to the engine.
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub entry_rules_collapsed: bool,
    #[serde(default)]
    pub exit_rules_collapsed: bool,
}

fn default_active() -> bool {
    true
}

/// A typed field update, one variant per editable strategy field.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyUpdate {
    Name(String),
    Allocation(f64),
    Direction(Direction),
    /// Checked against the current data source; disallowed values are
    /// silently replaced with the first allowed frequency.
    Frequency(Frequency),
    /// Variant switch through [`PositionSizing::switch_method`].
    SizingMethod(SizingMethod),
    /// Verbatim replacement of the sizing values.
    Sizing(PositionSizing),
    Active(bool),
    Collapsed(bool),
    EntryRulesCollapsed(bool),
    ExitRulesCollapsed(bool),
    RegimeAsset(String),
    RegimeAction(RegimeScope, Option<RegimeAction>),
}

impl Strategy {
    /// The strategy every "add strategy" click creates, numbered by its
    /// position in the workspace.
    pub fn numbered(number: usize, source: DataSource) -> Self {
        Self {
            name: format!("Strategy {number}"),
            allocation: 100.0,
            direction: Direction::Long,
            entry_rules: RuleSet::default(),
            exit_rules: RuleSet::default(),
            regime: RegimeFilter::default(),
            sizing: PositionSizing::fixed_default(),
            frequency: source.first_allowed(),
            active: true,
            collapsed: false,
            entry_rules_collapsed: false,
            exit_rules_collapsed: false,
        }
    }

    /// Apply one field update against the current data source, returning
    /// the updated strategy.
    pub fn apply(&self, source: DataSource, update: StrategyUpdate) -> Self {
        let mut next = self.clone();
        match update {
            StrategyUpdate::Name(name) => next.name = name,
            StrategyUpdate::Allocation(pct) => next.allocation = pct,
            StrategyUpdate::Direction(direction) => next.direction = direction,
            StrategyUpdate::Frequency(frequency) => {
                next.frequency = if source.allows(frequency) {
                    frequency
                } else {
                    source.first_allowed()
                };
            }
            StrategyUpdate::SizingMethod(method) => {
                next.sizing = next.sizing.switch_method(method);
            }
            StrategyUpdate::Sizing(sizing) => next.sizing = sizing,
            StrategyUpdate::Active(active) => next.active = active,
            StrategyUpdate::Collapsed(collapsed) => next.collapsed = collapsed,
            StrategyUpdate::EntryRulesCollapsed(collapsed) => {
                next.entry_rules_collapsed = collapsed;
            }
            StrategyUpdate::ExitRulesCollapsed(collapsed) => {
                next.exit_rules_collapsed = collapsed;
            }
            StrategyUpdate::RegimeAsset(asset) => {
                next.regime = next.regime.with_asset(&asset);
            }
            StrategyUpdate::RegimeAction(scope, action) => {
                next.regime = next.regime.with_action(scope, action);
            }
        }
        next
    }

    /// Reset the frequency if the (possibly new) data source no longer
    /// allows it.
    pub fn retarget(&self, source: DataSource) -> Self {
        if source.allows(self.frequency) {
            return self.clone();
        }
        let mut next = self.clone();
        next.frequency = source.first_allowed();
        next
    }
}
