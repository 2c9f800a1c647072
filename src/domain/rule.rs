//! Comparison rules and rule sets.
//!
//! A rule compares a left indicator against either a right indicator or a
//! literal value. Rules chain within their list through `connector`.
//!
//! # Fold Semantics
//!
//! A rule set is evaluated by the external engine as a strict left-to-right
//! fold: `result = r0; result = result <connector_i> r_i` for each later
//! rule. There is no operator precedence and no grouping: `A and B or C`
//! means `(A and B) or C`, never `A and (B or C)`. This is a wire contract;
//! introducing precedence would silently change trading behavior of saved
//! strategies. [`RuleSet::summary`] renders the fold parenthesization so
//! the order is visible to a reader.

use crate::domain::indicator::{IndicatorKind, IndicatorSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One comparison. `connector` is meaningful only for rules at index > 0 of
/// their containing list, where it joins the rule against the running fold
/// of everything before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "leftIndicator")]
    pub left: IndicatorSpec,
    pub operator: CompareOp,
    #[serde(rename = "useRightIndicator")]
    pub use_right_indicator: bool,
    #[serde(rename = "rightIndicator", default)]
    pub right: IndicatorSpec,
    #[serde(rename = "rightValue", default)]
    pub right_value: String,
    #[serde(rename = "logicalOperator")]
    pub connector: LogicalOp,
}

impl Rule {
    /// The rule every "add rule" click starts from.
    pub fn blank() -> Self {
        Self {
            left: IndicatorSpec::blank(),
            operator: CompareOp::Lt,
            use_right_indicator: false,
            right: IndicatorSpec::blank(),
            right_value: String::new(),
            connector: LogicalOp::And,
        }
    }

    fn side(&self, side: Side) -> &IndicatorSpec {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut IndicatorSpec {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// One-line rendering for collapsed summaries: `SMA < 30`,
    /// `Close >= EMA`, composites show as `Custom`.
    pub fn summary(&self) -> String {
        let left = describe_side(&self.left);
        let right = if self.use_right_indicator {
            describe_side(&self.right)
        } else if self.right_value.is_empty() {
            "?".to_string()
        } else {
            self.right_value.clone()
        };
        format!("{left} {} {right}", self.operator)
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::blank()
    }
}

fn describe_side(spec: &IndicatorSpec) -> String {
    match spec.kind {
        IndicatorKind::Composite => "Custom".to_string(),
        IndicatorKind::Simple if spec.name.is_empty() => "?".to_string(),
        IndicatorKind::Simple => spec.name.clone(),
    }
}

/// A typed field update, one variant per editable rule field. The reset
/// side effects mirror the visual editor exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleUpdate {
    IndicatorType(Side, IndicatorKind),
    IndicatorName(Side, String),
    Expression(Side, String),
    UseRightIndicator(bool),
    RightValue(String),
    Operator(CompareOp),
    Connector(LogicalOp),
}

/// An ordered list of rules. Order is the fold order and is fixed by
/// insertion and removal position. All mutators return a new set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a blank rule.
    pub fn push_default(&self) -> Self {
        let mut rules = self.0.clone();
        rules.push(Rule::blank());
        Self(rules)
    }

    /// Apply one field update to the rule at `index`. A stale index is a
    /// silent no-op.
    pub fn update(&self, index: usize, update: RuleUpdate) -> Self {
        let mut rules = self.0.clone();
        if let Some(rule) = rules.get_mut(index) {
            apply_update(rule, update);
        }
        Self(rules)
    }

    /// Set one parameter on a rule side. An empty value for a parameter
    /// named `series` stores the `Close` default; a stale index no-ops.
    pub fn set_param(&self, index: usize, side: Side, param: &str, value: &str) -> Self {
        let mut rules = self.0.clone();
        if let Some(rule) = rules.get_mut(index) {
            let stored = if param == "series" && value.is_empty() {
                "Close"
            } else {
                value
            };
            rule.side_mut(side)
                .params
                .insert(param.to_string(), stored.to_string());
        }
        Self(rules)
    }

    /// Delete the rule at `index`. Survivors keep their order and their own
    /// connectors, so their fold position shifts: removing rule 0 makes the
    /// old rule 1's connector apply against an empty base, which can change
    /// the boolean meaning of the list. Callers own any renumbering.
    pub fn remove(&self, index: usize) -> Self {
        let mut rules = self.0.clone();
        if index < rules.len() {
            rules.remove(index);
        }
        Self(rules)
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.0.get(index)
    }

    /// Render the left-to-right fold with explicit parentheses:
    /// `(A and B) or C`.
    pub fn summary(&self) -> String {
        let mut iter = self.0.iter();
        let Some(first) = iter.next() else {
            return String::new();
        };
        let mut acc = first.summary();
        for (joined, rule) in iter.enumerate() {
            if joined > 0 {
                acc = format!("({acc})");
            }
            acc = format!("{acc} {} {}", rule.connector, rule.summary());
        }
        acc
    }
}

fn apply_update(rule: &mut Rule, update: RuleUpdate) {
    match update {
        RuleUpdate::IndicatorType(side, kind) => {
            let next = rule.side(side).with_kind(kind);
            *rule.side_mut(side) = next;
        }
        RuleUpdate::IndicatorName(side, name) => {
            let next = rule.side(side).with_name(&name);
            *rule.side_mut(side) = next;
        }
        RuleUpdate::Expression(side, text) => {
            let next = rule.side(side).with_expression(&text);
            *rule.side_mut(side) = next;
        }
        RuleUpdate::UseRightIndicator(used) => {
            rule.use_right_indicator = used;
            if !used {
                // literal mode: drop the indicator placeholder and literal both
                rule.right = IndicatorSpec::blank();
                rule.right_value.clear();
            }
        }
        RuleUpdate::RightValue(value) => rule.right_value = value,
        RuleUpdate::Operator(op) => rule.operator = op,
        RuleUpdate::Connector(op) => rule.connector = op,
    }
}
