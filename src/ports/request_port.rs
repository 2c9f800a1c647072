//! Backtest request delivery port trait.
//!
//! The external engine sits behind this seam. Transport is not this
//! crate's concern; the shipped adapter renders the request to JSON on a
//! file or stdout for whatever carries it onward.

use crate::domain::error::QuantifiError;
use crate::domain::payload::BacktestRequest;

pub trait RequestPort {
    fn deliver(&self, request: &BacktestRequest) -> Result<(), QuantifiError>;
}
