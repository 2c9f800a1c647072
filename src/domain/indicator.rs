//! Indicator reference model.
//!
//! A rule side references either a simple indicator (name + parameter map)
//! or a composite indicator (a call-expression string, usually produced by
//! the expression stack compiler but freely hand-editable). One struct
//! carries both shapes; `kind` says which fields are live.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter value used for an unset `series` parameter at read time.
pub const DEFAULT_SERIES: &str = "Close";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Simple,
    Composite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    #[serde(rename = "type")]
    pub kind: IndicatorKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub expression: String,
}

impl IndicatorSpec {
    /// The empty simple indicator every new rule side starts from.
    pub fn blank() -> Self {
        Self {
            kind: IndicatorKind::Simple,
            name: String::new(),
            params: BTreeMap::new(),
            expression: String::new(),
        }
    }

    pub fn simple(name: &str, params: &[(&str, &str)]) -> Self {
        Self {
            kind: IndicatorKind::Simple,
            name: name.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            expression: String::new(),
        }
    }

    pub fn composite(expression: &str) -> Self {
        Self {
            kind: IndicatorKind::Composite,
            name: String::new(),
            params: BTreeMap::new(),
            expression: expression.to_string(),
        }
    }

    /// Switch the indicator shape, applying the editor's reset semantics:
    /// simple clears everything composite, composite clears the simple
    /// fields but keeps any expression text already typed.
    pub fn with_kind(&self, kind: IndicatorKind) -> Self {
        let mut next = self.clone();
        next.kind = kind;
        match kind {
            IndicatorKind::Simple => {
                next.expression.clear();
                next.name.clear();
                next.params.clear();
            }
            IndicatorKind::Composite => {
                next.name.clear();
                next.params.clear();
            }
        }
        next
    }

    /// Rename the indicator. Parameters are dropped; the catalog re-derives
    /// them at read time.
    pub fn with_name(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.name = name.to_string();
        next.params.clear();
        next
    }

    pub fn with_expression(&self, expression: &str) -> Self {
        let mut next = self.clone();
        next.expression = expression.to_string();
        next
    }

    /// Read one parameter, applying the lazy `series` default: an unset or
    /// empty `series` reads as `"Close"`. Never stored at creation.
    pub fn param_or_default(&self, param: &str) -> &str {
        match self.params.get(param).map(String::as_str) {
            Some(v) if !v.is_empty() => v,
            _ if param == "series" => DEFAULT_SERIES,
            _ => "",
        }
    }
}

impl Default for IndicatorSpec {
    fn default() -> Self {
        Self::blank()
    }
}
