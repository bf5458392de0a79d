//! Read-only storage boundary for CRT rows.
//!
//! Stores return raw left-joined rows; turning them into canonical documents
//! is the resolver's job. Every store serves exactly one schema revision.

pub mod in_memory;
pub mod postgres;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use cartaporte_core::{CrtId, WaybillNumber};
use cartaporte_documents::RawCrtRow;

pub use in_memory::{Carrier, ChargeRecord, CrtRecord, InMemoryCrtStore, PartyRecord};
pub use postgres::PostgresCrtStore;
pub use schema::{LegacyAdapter, NormalizedAdapter, SchemaAdapter, SchemaRevision};

/// Driver text for a lookup that matched no row.
pub const NO_ROWS: &str = "no rows returned by a query that expected to return at least one row";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The lookup matched no row; carries the driver's error text.
    #[error("{0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

#[async_trait]
pub trait CrtStore: Send + Sync {
    /// The schema revision rows are read with.
    fn revision(&self) -> SchemaRevision;

    async fn fetch_by_id(&self, id: CrtId) -> Result<RawCrtRow, StoreError>;

    async fn fetch_by_number(&self, number: &WaybillNumber) -> Result<RawCrtRow, StoreError>;

    /// Newest rows first, by descending id.
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawCrtRow>, StoreError>;

    /// Highest waybill number of a carrier among numbers with the given
    /// prefix and total length.
    async fn latest_number(
        &self,
        carrier_id: i64,
        prefix: &str,
        len: usize,
    ) -> Result<Option<String>, StoreError>;
}

#[async_trait]
impl<S> CrtStore for Arc<S>
where
    S: CrtStore + ?Sized,
{
    fn revision(&self) -> SchemaRevision {
        (**self).revision()
    }

    async fn fetch_by_id(&self, id: CrtId) -> Result<RawCrtRow, StoreError> {
        (**self).fetch_by_id(id).await
    }

    async fn fetch_by_number(&self, number: &WaybillNumber) -> Result<RawCrtRow, StoreError> {
        (**self).fetch_by_number(number).await
    }

    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawCrtRow>, StoreError> {
        (**self).fetch_recent(limit).await
    }

    async fn latest_number(
        &self,
        carrier_id: i64,
        prefix: &str,
        len: usize,
    ) -> Result<Option<String>, StoreError> {
        (**self).latest_number(carrier_id, prefix, len).await
    }
}
