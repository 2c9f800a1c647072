//! Regime filter.
//!
//! Gates a strategy by the state of a reference asset: one rule list
//! controls which entry direction stays allowed, the other forces exits of
//! a direction. Either action may be off while its rule list still holds
//! rules; the lists serialize regardless and the engine ignores unactioned
//! ones.

use crate::domain::rule::RuleSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeAction {
    Long,
    Short,
}

/// Which of the two regime rule lists a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeScope {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeFilter {
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub entry_action: Option<RegimeAction>,
    #[serde(default)]
    pub entry_rules: RuleSet,
    #[serde(default)]
    pub exit_action: Option<RegimeAction>,
    #[serde(default)]
    pub exit_rules: RuleSet,
}

impl RegimeFilter {
    pub fn rules(&self, scope: RegimeScope) -> &RuleSet {
        match scope {
            RegimeScope::Entry => &self.entry_rules,
            RegimeScope::Exit => &self.exit_rules,
        }
    }

    pub fn with_rules(&self, scope: RegimeScope, rules: RuleSet) -> Self {
        let mut next = self.clone();
        match scope {
            RegimeScope::Entry => next.entry_rules = rules,
            RegimeScope::Exit => next.exit_rules = rules,
        }
        next
    }

    pub fn with_action(&self, scope: RegimeScope, action: Option<RegimeAction>) -> Self {
        let mut next = self.clone();
        match scope {
            RegimeScope::Entry => next.entry_action = action,
            RegimeScope::Exit => next.exit_action = action,
        }
        next
    }

    pub fn with_asset(&self, asset: &str) -> Self {
        let mut next = self.clone();
        next.asset = asset.to_string();
        next
    }

    /// True when nothing about the filter has been configured.
    pub fn is_unconfigured(&self) -> bool {
        self.asset.is_empty()
            && self.entry_action.is_none()
            && self.exit_action.is_none()
            && self.entry_rules.is_empty()
            && self.exit_rules.is_empty()
    }
}
