//! Raw left-joined rows and their resolution into canonical documents.

use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::document::{ChargeLine, CrtDocument};
use crate::projection::assemble;

/// One CRT row as a bag of nullable text columns.
///
/// Storage adapters fill it with whatever their schema revision exposes:
/// an older revision only supplies party display names (`remitente`), a
/// newer one supplies the detailed columns (`remitente_nombre`,
/// `remitente_ciudad`, ...). NULL columns are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCrtRow {
    pub id: i64,
    columns: BTreeMap<String, String>,
    pub charges: Vec<ChargeLine>,
}

impl RawCrtRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Record a column value; `None` (SQL NULL) leaves the column absent.
    pub fn set(&mut self, column: impl Into<String>, value: Option<String>) {
        if let Some(value) = value {
            self.columns.insert(column.into(), value);
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column, Some(value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

/// Resolve a raw row into its canonical document.
///
/// Total: every absent column becomes an empty string and every party gets
/// both name aliases from whichever one the row carried.
pub fn resolve(row: RawCrtRow) -> CrtDocument {
    let RawCrtRow { id, columns, charges } = row;
    let resolved: Result<CrtDocument, Infallible> =
        assemble(id, |key| Ok(columns.get(key).cloned()));
    let mut doc = match resolved {
        Ok(doc) => doc,
        Err(never) => match never {},
    };
    doc.charges = charges;
    doc
}
