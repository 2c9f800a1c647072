//! JSON request delivery adapter.
//!
//! Renders the assembled backtest request as pretty-printed JSON, to a file
//! when a path is configured and to stdout otherwise.

use crate::domain::error::QuantifiError;
use crate::domain::payload::BacktestRequest;
use crate::ports::request_port::RequestPort;
use std::fs;
use std::path::PathBuf;

pub struct JsonRequestAdapter {
    output: Option<PathBuf>,
}

impl JsonRequestAdapter {
    pub fn to_file(path: PathBuf) -> Self {
        Self { output: Some(path) }
    }

    pub fn to_stdout() -> Self {
        Self { output: None }
    }

    pub fn render(request: &BacktestRequest) -> Result<String, QuantifiError> {
        Ok(serde_json::to_string_pretty(request)?)
    }
}

impl RequestPort for JsonRequestAdapter {
    fn deliver(&self, request: &BacktestRequest) -> Result<(), QuantifiError> {
        let mut text = Self::render(request)?;
        text.push('\n');
        match &self.output {
            Some(path) => fs::write(path, text)?,
            None => print!("{text}"),
        }
        Ok(())
    }
}
