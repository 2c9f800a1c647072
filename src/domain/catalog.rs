//! Indicator catalog.
//!
//! Maps indicator names to their ordered parameter lists. The catalog is
//! configuration, not computation: the lab ships a stock set, and an
//! `[indicators]` section in the config file replaces it wholesale
//! (`SMA = series, window`; an empty value declares a leaf indicator).

use crate::ports::config_port::ConfigPort;
use serde::{Deserialize, Serialize};

pub const CATALOG_SECTION: &str = "indicators";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub params: Vec<String>,
}

impl CatalogEntry {
    pub fn new(name: &str, params: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Ordered indicator registry. Lookups never fail: an unknown name has no
/// declared parameters, and downstream output degrades instead of erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorCatalog {
    entries: Vec<CatalogEntry>,
}

impl IndicatorCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The stock catalog of the lab.
    pub fn builtin() -> Self {
        Self::new(vec![
            CatalogEntry::new("Open", &[]),
            CatalogEntry::new("High", &[]),
            CatalogEntry::new("Low", &[]),
            CatalogEntry::new("Close", &[]),
            CatalogEntry::new("Volume", &[]),
            CatalogEntry::new("SMA", &["series", "window"]),
            CatalogEntry::new("EMA", &["series", "window"]),
            CatalogEntry::new("Rolling_High", &["series", "window"]),
            CatalogEntry::new("Rolling_Low", &["series", "window"]),
            CatalogEntry::new("MA_trend", &["series", "ma_window", "return_window"]),
            CatalogEntry::new("VWAP", &[]),
            CatalogEntry::new("Average_Move_From_Open", &["window"]),
        ])
    }

    /// Build the catalog from an `[indicators]` config section, falling back
    /// to the stock set when the section is absent or empty.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let names = config.keys(CATALOG_SECTION);
        if names.is_empty() {
            return Self::builtin();
        }

        let entries = names
            .into_iter()
            .map(|name| {
                let params = config
                    .get_string(CATALOG_SECTION, &name)
                    .unwrap_or_default()
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                CatalogEntry { name, params }
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Declared parameter names for `name`, in declaration order. Unknown
    /// names resolve to no parameters.
    pub fn params_for(&self, name: &str) -> &[String] {
        self.get(name).map(|e| e.params.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
