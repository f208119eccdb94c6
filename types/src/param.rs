//! Typed parameter values carried by action requests.
//!
//! Parameters are a flat key-value bag. Values are typed so that limit
//! checks (amounts, sizes) never have to parse strings, and so the canonical
//! audit digest has an unambiguous byte encoding per value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single typed parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Decimal(f64),
    Text(String),
    Flag(bool),
}

impl ParamValue {
    /// Numeric view used by limit checks. `Text`/`Flag` have no magnitude.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Decimal(v) => Some(*v),
            Self::Text(_) | Self::Flag(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}
