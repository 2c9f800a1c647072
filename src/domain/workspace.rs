//! Strategy workspace.
//!
//! The single owning aggregate over the strategy list and the active data
//! source. Every external caller edits through this surface; nothing else
//! holds the list. Element-level operations delegate to the pure mutators
//! of the rule and strategy modules, and stale indices are silent no-ops so
//! an event-driven caller survives out-of-date edits.

use crate::domain::regime::RegimeScope;
use crate::domain::rule::{RuleSet, RuleUpdate, Side};
use crate::domain::strategy::{DataSource, Strategy, StrategyUpdate};
use serde::{Deserialize, Serialize};

/// Which of a strategy's four rule lists an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Entry,
    Exit,
    RegimeEntry,
    RegimeExit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCollection {
    data_source: DataSource,
    #[serde(default)]
    strategies: Vec<Strategy>,
}

impl StrategyCollection {
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source,
            strategies: Vec::new(),
        }
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Strategy> {
        self.strategies.get(index)
    }

    /// Change the data source; strategies whose frequency the new source
    /// disallows are reset to its first allowed value.
    pub fn set_data_source(&mut self, source: DataSource) {
        self.data_source = source;
        self.strategies = self
            .strategies
            .iter()
            .map(|s| s.retarget(source))
            .collect();
    }

    /// Append a new strategy with the documented defaults.
    pub fn add(&mut self) {
        self.strategies
            .push(Strategy::numbered(self.strategies.len() + 1, self.data_source));
    }

    pub fn update(&mut self, index: usize, update: StrategyUpdate) {
        if index < self.strategies.len() {
            let next = self.strategies[index].apply(self.data_source, update);
            self.strategies[index] = next;
        }
    }

    pub fn delete(&mut self, index: usize) {
        if index < self.strategies.len() {
            self.strategies.remove(index);
        }
    }

    /// Deep-copy the strategy at `index`, rename it by the copy rule, and
    /// append it expanded. The copy shares nothing with the original.
    pub fn duplicate(&mut self, index: usize) {
        let Some(original) = self.strategies.get(index) else {
            return;
        };
        let mut copy = original.clone();
        copy.name = self.copy_name(&original.name);
        copy.collapsed = false;
        self.strategies.push(copy);
    }

    /// Compute the duplicate's name: strip a trailing ` Copy` / ` Copy N`
    /// to get the base, then number one past the highest existing copy of
    /// that base. The first copy carries no number.
    fn copy_name(&self, original: &str) -> String {
        let base = copy_base(original);
        let mut next = 1u32;
        for strategy in &self.strategies {
            if let Some(number) = copy_number(&strategy.name, base) {
                if number >= next {
                    next = number + 1;
                }
            }
        }
        if next > 1 {
            format!("{base} Copy {next}")
        } else {
            format!("{base} Copy")
        }
    }

    fn rules(&self, index: usize, scope: RuleScope) -> Option<&RuleSet> {
        let strategy = self.strategies.get(index)?;
        Some(match scope {
            RuleScope::Entry => &strategy.entry_rules,
            RuleScope::Exit => &strategy.exit_rules,
            RuleScope::RegimeEntry => &strategy.regime.entry_rules,
            RuleScope::RegimeExit => &strategy.regime.exit_rules,
        })
    }

    fn put_rules(&mut self, index: usize, scope: RuleScope, rules: RuleSet) {
        let strategy = &mut self.strategies[index];
        match scope {
            RuleScope::Entry => strategy.entry_rules = rules,
            RuleScope::Exit => strategy.exit_rules = rules,
            RuleScope::RegimeEntry => {
                strategy.regime = strategy.regime.with_rules(RegimeScope::Entry, rules);
            }
            RuleScope::RegimeExit => {
                strategy.regime = strategy.regime.with_rules(RegimeScope::Exit, rules);
            }
        }
    }

    pub fn add_rule(&mut self, index: usize, scope: RuleScope) {
        if let Some(rules) = self.rules(index, scope) {
            let next = rules.push_default();
            self.put_rules(index, scope, next);
        }
    }

    pub fn update_rule(
        &mut self,
        index: usize,
        scope: RuleScope,
        rule_index: usize,
        update: RuleUpdate,
    ) {
        if let Some(rules) = self.rules(index, scope) {
            let next = rules.update(rule_index, update);
            self.put_rules(index, scope, next);
        }
    }

    pub fn set_rule_param(
        &mut self,
        index: usize,
        scope: RuleScope,
        rule_index: usize,
        side: Side,
        param: &str,
        value: &str,
    ) {
        if let Some(rules) = self.rules(index, scope) {
            let next = rules.set_param(rule_index, side, param, value);
            self.put_rules(index, scope, next);
        }
    }

    pub fn remove_rule(&mut self, index: usize, scope: RuleScope, rule_index: usize) {
        if let Some(rules) = self.rules(index, scope) {
            let next = rules.remove(rule_index);
            self.put_rules(index, scope, next);
        }
    }
}

/// Strip a trailing ` Copy` or ` Copy N` suffix.
fn copy_base(name: &str) -> &str {
    if let Some(base) = name.strip_suffix(" Copy") {
        return base;
    }
    if let Some(pos) = name.rfind(" Copy ") {
        let tail = &name[pos + " Copy ".len()..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return &name[..pos];
        }
    }
    name
}

/// The copy number of `name` relative to `base`: `base Copy` counts as 1,
/// `base Copy N` as N. Anything else does not count.
fn copy_number(name: &str, base: &str) -> Option<u32> {
    let rest = name.strip_prefix(base)?;
    if rest == " Copy" {
        return Some(1);
    }
    let digits = rest.strip_prefix(" Copy ")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::{CompareOp, LogicalOp};
    use crate::domain::strategy::Frequency;

    fn workspace_with(names: &[&str]) -> StrategyCollection {
        let mut ws = StrategyCollection::new(DataSource::Binance);
        for name in names {
            ws.add();
            let last = ws.len() - 1;
            ws.update(last, StrategyUpdate::Name(name.to_string()));
        }
        ws
    }

    #[test]
    fn add_numbers_strategies_by_position() {
        let mut ws = StrategyCollection::new(DataSource::YahooFinance);
        ws.add();
        ws.add();
        assert_eq!(ws.get(0).unwrap().name, "Strategy 1");
        assert_eq!(ws.get(1).unwrap().name, "Strategy 2");
    }

    #[test]
    fn first_duplicate_carries_no_number() {
        let mut ws = workspace_with(&["Alpha"]);
        ws.duplicate(0);
        assert_eq!(ws.get(1).unwrap().name, "Alpha Copy");
    }

    #[test]
    fn second_duplicate_is_numbered_two() {
        let mut ws = workspace_with(&["Alpha", "Alpha Copy"]);
        ws.duplicate(0);
        assert_eq!(ws.get(2).unwrap().name, "Alpha Copy 2");
    }

    #[test]
    fn duplicating_a_copy_reuses_the_base_name() {
        let mut ws = workspace_with(&["Alpha", "Alpha Copy", "Alpha Copy 2"]);
        ws.duplicate(2);
        assert_eq!(ws.get(3).unwrap().name, "Alpha Copy 3");
    }

    #[test]
    fn copy_numbering_skips_past_the_highest() {
        let mut ws = workspace_with(&["Alpha", "Alpha Copy 7"]);
        ws.duplicate(0);
        assert_eq!(ws.get(2).unwrap().name, "Alpha Copy 8");
    }

    #[test]
    fn unrelated_names_do_not_affect_numbering() {
        let mut ws = workspace_with(&["Alpha", "Alphabet Copy"]);
        ws.duplicate(0);
        // "Alphabet Copy" is not a copy of "Alpha"
        assert_eq!(ws.get(2).unwrap().name, "Alpha Copy");
    }

    #[test]
    fn duplicate_is_a_deep_independent_copy() {
        let mut ws = workspace_with(&["Alpha"]);
        ws.add_rule(0, RuleScope::Entry);
        ws.duplicate(0);
        ws.remove_rule(0, RuleScope::Entry, 0);
        assert!(ws.get(0).unwrap().entry_rules.is_empty());
        assert_eq!(ws.get(1).unwrap().entry_rules.len(), 1);
    }

    #[test]
    fn duplicate_always_lands_expanded() {
        let mut ws = workspace_with(&["Alpha"]);
        ws.update(0, StrategyUpdate::Collapsed(true));
        ws.duplicate(0);
        assert!(!ws.get(1).unwrap().collapsed);
    }

    #[test]
    fn delete_removes_by_index() {
        let mut ws = workspace_with(&["Alpha", "Beta", "Gamma"]);
        ws.delete(1);
        let names: Vec<_> = ws.strategies().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Gamma"]);
    }

    #[test]
    fn stale_indices_are_no_ops() {
        let mut ws = workspace_with(&["Alpha"]);
        let before = ws.clone();
        ws.update(5, StrategyUpdate::Active(false));
        ws.delete(5);
        ws.duplicate(5);
        ws.add_rule(5, RuleScope::Entry);
        ws.remove_rule(0, RuleScope::Entry, 5);
        assert_eq!(ws, before);
    }

    #[test]
    fn source_change_resets_disallowed_frequencies() {
        let mut ws = workspace_with(&["Alpha", "Beta"]);
        ws.update(0, StrategyUpdate::Frequency(Frequency::H1));
        ws.set_data_source(DataSource::YahooFinance);
        assert_eq!(ws.get(0).unwrap().frequency, Frequency::Daily);
        assert_eq!(ws.get(1).unwrap().frequency, Frequency::Daily);
    }

    #[test]
    fn rule_edits_route_to_the_scoped_list() {
        let mut ws = workspace_with(&["Alpha"]);
        ws.add_rule(0, RuleScope::Entry);
        ws.add_rule(0, RuleScope::RegimeExit);
        ws.update_rule(0, RuleScope::RegimeExit, 0, RuleUpdate::Operator(CompareOp::Ge));
        ws.update_rule(0, RuleScope::RegimeExit, 0, RuleUpdate::Connector(LogicalOp::Or));

        let strategy = ws.get(0).unwrap();
        assert_eq!(strategy.entry_rules.len(), 1);
        assert_eq!(strategy.entry_rules.get(0).unwrap().operator, CompareOp::Lt);
        let regime_rule = strategy.regime.exit_rules.get(0).unwrap();
        assert_eq!(regime_rule.operator, CompareOp::Ge);
        assert_eq!(regime_rule.connector, LogicalOp::Or);
        assert!(strategy.exit_rules.is_empty());
        assert!(strategy.regime.entry_rules.is_empty());
    }

    #[test]
    fn set_rule_param_reaches_the_scoped_rule() {
        let mut ws = workspace_with(&["Alpha"]);
        ws.add_rule(0, RuleScope::Exit);
        ws.update_rule(
            0,
            RuleScope::Exit,
            0,
            RuleUpdate::IndicatorName(Side::Left, "SMA".into()),
        );
        ws.set_rule_param(0, RuleScope::Exit, 0, Side::Left, "window", "20");
        let rule = ws.get(0).unwrap().exit_rules.get(0).unwrap();
        assert_eq!(rule.left.params.get("window").unwrap(), "20");
    }
}
