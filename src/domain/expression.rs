//! Expression stack compiler.
//!
//! The composite-indicator editor builds an ordered stack of function and
//! indicator entries; compilation folds the stack into a single nested
//! call-expression string.
//!
//! # Compilation Semantics
//!
//! - A function entry wraps everything accumulated so far and stays open
//!   until the end of the stack.
//! - An indicator entry appends `Name(v1,v2,...)` with empty parameter
//!   values skipped, followed by `", "` when a function is open and more
//!   items follow.
//! - One closing parenthesis per function entry is appended at the end.
//!
//! The result is a purely sequential, right-nesting expression: functions
//! wrap the running total rather than taking independently built children,
//! so `[max, SMA, EMA]` compiles to `max(SMA(...), EMA(...))` but arbitrary
//! multi-argument trees are not representable. That shape is load-bearing
//! for saved strategies; a future explicit-AST compiler would replace this
//! module behind the same [`ExpressionStack`] surface.
//!
//! Compilation is total and deterministic. A malformed stack still compiles
//! to best-effort text; only the external engine judges expressions.

use crate::domain::catalog::CatalogEntry;
use crate::domain::indicator::DEFAULT_SERIES;
use serde::{Deserialize, Serialize};

/// A function available to composite expressions, with its arity bounds.
/// The bounds are editor hints; compilation does not enforce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: &'static str,
    pub min_params: usize,
    pub max_params: Option<usize>,
}

/// The stock function table of the composite-indicator editor.
pub const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef { name: "max", min_params: 2, max_params: None },
    FunctionDef { name: "min", min_params: 2, max_params: None },
    FunctionDef { name: "mean", min_params: 2, max_params: None },
    FunctionDef { name: "add", min_params: 2, max_params: None },
    FunctionDef { name: "subtract", min_params: 2, max_params: Some(2) },
    FunctionDef { name: "multiply", min_params: 2, max_params: None },
    FunctionDef { name: "divide", min_params: 2, max_params: Some(2) },
];

pub fn function(name: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// One entry of the expression stack. Indicator parameters are an ordered
/// list so compiled output follows catalog declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StackItem {
    Function {
        name: String,
        min_params: usize,
        max_params: Option<usize>,
    },
    Indicator {
        name: String,
        params: Vec<(String, String)>,
    },
}

/// An ordered expression stack. All editing operations return a new stack;
/// the input is never aliased.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStack {
    items: Vec<StackItem>,
}

impl ExpressionStack {
    pub fn new(items: Vec<StackItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[StackItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push_function(&self, func: &FunctionDef) -> Self {
        let mut items = self.items.clone();
        items.push(StackItem::Function {
            name: func.name.to_string(),
            min_params: func.min_params,
            max_params: func.max_params,
        });
        Self { items }
    }

    /// Append an indicator with parameters initialized from its catalog
    /// entry. A parameter named `series` starts at `"Close"`; the rest
    /// start empty.
    pub fn push_indicator(&self, entry: &CatalogEntry) -> Self {
        let params = entry
            .params
            .iter()
            .map(|p| {
                let initial = if p == "series" { DEFAULT_SERIES } else { "" };
                (p.clone(), initial.to_string())
            })
            .collect();
        let mut items = self.items.clone();
        items.push(StackItem::Indicator {
            name: entry.name.clone(),
            params,
        });
        Self { items }
    }

    /// Set one parameter on the indicator at `index`. A stale index or a
    /// function entry is a silent no-op; an undeclared parameter name is
    /// appended rather than rejected.
    pub fn set_param(&self, index: usize, param: &str, value: &str) -> Self {
        let mut items = self.items.clone();
        if let Some(StackItem::Indicator { params, .. }) = items.get_mut(index) {
            match params.iter_mut().find(|(name, _)| name == param) {
                Some((_, stored)) => *stored = value.to_string(),
                None => params.push((param.to_string(), value.to_string())),
            }
        }
        Self { items }
    }

    /// Remove the entry at `index`, preserving the order of the rest.
    /// A stale index is a silent no-op.
    pub fn remove(&self, index: usize) -> Self {
        let mut items = self.items.clone();
        if index < items.len() {
            items.remove(index);
        }
        Self { items }
    }

    /// Compile the stack to its call-expression string.
    pub fn compile(&self) -> String {
        let mut expr = String::new();
        let mut saw_function = false;
        let last = self.items.len().saturating_sub(1);

        for (index, item) in self.items.iter().enumerate() {
            match item {
                StackItem::Function { name, .. } => {
                    let joiner = if expr.is_empty() { "" } else { ", " };
                    expr = format!("{name}({expr}{joiner}");
                    saw_function = true;
                }
                StackItem::Indicator { name, params } => {
                    let args: Vec<&str> = params
                        .iter()
                        .map(|(_, value)| value.as_str())
                        .filter(|value| !value.is_empty())
                        .collect();
                    expr.push_str(name);
                    expr.push('(');
                    expr.push_str(&args.join(","));
                    expr.push(')');
                    if saw_function && index < last {
                        expr.push_str(", ");
                    }
                }
            }
        }

        let depth = self
            .items
            .iter()
            .filter(|item| matches!(item, StackItem::Function { .. }))
            .count();
        expr.push_str(&")".repeat(depth));
        expr
    }
}

/// One composite-indicator editing session: the stack plus the last
/// compiled text. [`ExpressionEditor::refresh`] reports a change only when
/// the output actually differs, so a reactive "recompute on every edit,
/// notify on change" caller settles instead of oscillating.
#[derive(Debug, Clone, Default)]
pub struct ExpressionEditor {
    stack: ExpressionStack,
    expression: String,
}

impl ExpressionEditor {
    pub fn new(initial_expression: &str) -> Self {
        Self {
            stack: ExpressionStack::default(),
            expression: initial_expression.to_string(),
        }
    }

    pub fn stack(&self) -> &ExpressionStack {
        &self.stack
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn push_function(&mut self, func: &FunctionDef) {
        self.stack = self.stack.push_function(func);
    }

    pub fn push_indicator(&mut self, entry: &CatalogEntry) {
        self.stack = self.stack.push_indicator(entry);
    }

    pub fn set_param(&mut self, index: usize, param: &str, value: &str) {
        self.stack = self.stack.set_param(index, param, value);
    }

    pub fn remove(&mut self, index: usize) {
        self.stack = self.stack.remove(index);
    }

    /// Recompile and return the new expression only if it changed.
    pub fn refresh(&mut self) -> Option<&str> {
        let next = self.stack.compile();
        if next == self.expression {
            return None;
        }
        self.expression = next;
        Some(&self.expression)
    }
}
