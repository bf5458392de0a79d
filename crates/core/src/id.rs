//! Strongly-typed identifiers and record selectors.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Numeric identity of a CRT row (`crts.id`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrtId(i64);

impl CrtId {
    /// Identities are positive; zero and negatives never address a row.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::invalid_id(format!("CrtId must be positive, got {value}")));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for CrtId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for CrtId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("CrtId: {e}")))?;
        Self::new(value)
    }
}

/// Human-readable waybill number (`crts.numero_crt`), e.g. `PY000000042`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaybillNumber(String);

impl WaybillNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("WaybillNumber must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for WaybillNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a caller addresses a single CRT.
///
/// Parsed from one path segment. When a segment is all ASCII digits it is an
/// id, even if a waybill number with the same text exists. Digit segments
/// outside the id range (`0`, or too large for `i64`) still address by id;
/// they simply can never match a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(CrtId),
    UnmatchableId(String),
    Number(WaybillNumber),
}

impl FromStr for Selector {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(match s.parse::<CrtId>() {
                Ok(id) => Selector::Id(id),
                Err(_) => Selector::UnmatchableId(s.to_string()),
            });
        }
        Ok(Selector::Number(WaybillNumber::new(s)?))
    }
}

impl core::fmt::Display for Selector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "id {id}"),
            Selector::UnmatchableId(raw) => write!(f, "id {raw}"),
            Selector::Number(n) => write!(f, "número {n}"),
        }
    }
}
