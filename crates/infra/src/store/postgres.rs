//! Postgres-backed CRT store.
//!
//! The pool is injected at construction and shared read-only; timeouts are
//! the pool's `acquire_timeout`. No transactions, no retries.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | RowNotFound | `NotFound` (driver text) |
//! | Database / PoolTimedOut / PoolClosed / other | `Storage` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{Span, instrument};

use cartaporte_core::{CrtId, WaybillNumber};
use cartaporte_documents::RawCrtRow;

use super::schema::{PROBE_SQL, SchemaAdapter, SchemaRevision, adapter_for};
use super::{CrtStore, StoreError};

pub struct PostgresCrtStore {
    pool: Arc<PgPool>,
    adapter: Box<dyn SchemaAdapter>,
}

impl std::fmt::Debug for PostgresCrtStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCrtStore")
            .field("revision", &self.adapter.revision())
            .finish_non_exhaustive()
    }
}

impl PostgresCrtStore {
    /// Build a store for `revision`, probing the catalog when it is `Auto`.
    pub async fn connect(pool: PgPool, revision: SchemaRevision) -> Result<Self, StoreError> {
        let revision = match revision {
            SchemaRevision::Auto => probe_revision(&pool).await?,
            fixed => fixed,
        };
        let adapter = adapter_for(revision)
            .ok_or_else(|| StoreError::Storage(format!("no adapter for schema revision {revision}")))?;
        tracing::info!(revision = %revision, "crt store ready");
        Ok(Self::with_adapter(pool, adapter))
    }

    pub fn with_adapter(pool: PgPool, adapter: Box<dyn SchemaAdapter>) -> Self {
        Self {
            pool: Arc::new(pool),
            adapter,
        }
    }

    fn decode_all(&self, rows: &[sqlx::postgres::PgRow]) -> Result<Vec<RawCrtRow>, StoreError> {
        rows.iter().map(|row| self.adapter.decode(row)).collect()
    }
}

/// Pick the revision the live database matches.
#[instrument(skip(pool), fields(revision), err)]
pub async fn probe_revision(pool: &PgPool) -> Result<SchemaRevision, StoreError> {
    let normalized: bool = sqlx::query_scalar(PROBE_SQL)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("probe_revision", e))?;
    let revision = if normalized {
        SchemaRevision::Normalized
    } else {
        SchemaRevision::Legacy
    };
    Span::current().record("revision", revision.as_str());
    Ok(revision)
}

#[async_trait]
impl CrtStore for PostgresCrtStore {
    fn revision(&self) -> SchemaRevision {
        self.adapter.revision()
    }

    #[instrument(skip(self), fields(crt_id = id.get(), revision = %self.adapter.revision()), err)]
    async fn fetch_by_id(&self, id: CrtId) -> Result<RawCrtRow, StoreError> {
        let sql = format!("{} WHERE c.id = $1", self.adapter.projection_sql());
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_by_id", e))?;
        self.adapter.decode(&row)
    }

    #[instrument(skip(self), fields(numero_crt = %number, revision = %self.adapter.revision()), err)]
    async fn fetch_by_number(&self, number: &WaybillNumber) -> Result<RawCrtRow, StoreError> {
        let sql = format!("{} WHERE c.numero_crt = $1", self.adapter.projection_sql());
        let row = sqlx::query(&sql)
            .bind(number.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_by_number", e))?;
        self.adapter.decode(&row)
    }

    #[instrument(skip(self), fields(revision = %self.adapter.revision(), row_count), err)]
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawCrtRow>, StoreError> {
        let sql = format!(
            "{} ORDER BY c.id DESC LIMIT $1",
            self.adapter.projection_sql()
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_recent", e))?;
        Span::current().record("row_count", rows.len());
        self.decode_all(&rows)
    }

    #[instrument(skip(self), err)]
    async fn latest_number(
        &self,
        carrier_id: i64,
        prefix: &str,
        len: usize,
    ) -> Result<Option<String>, StoreError> {
        let len = i32::try_from(len)
            .map_err(|_| StoreError::Storage(format!("waybill length {len} out of range")))?;
        sqlx::query_scalar(
            r#"
            SELECT numero_crt
            FROM crts
            WHERE transportadora_id = $1
              AND numero_crt LIKE $2 || '%'
              AND length(numero_crt) = $3
            ORDER BY numero_crt DESC
            LIMIT 1
            "#,
        )
        .bind(carrier_id)
        .bind(prefix)
        .bind(len)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_number", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        sqlx::Error::Database(db_err) => {
            StoreError::Storage(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Storage(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NO_ROWS;

    #[test]
    fn row_not_found_keeps_driver_text() {
        let err = map_sqlx_error("fetch_by_id", sqlx::Error::RowNotFound);
        assert_eq!(err, StoreError::NotFound(NO_ROWS.to_string()));
    }

    #[test]
    fn pool_failures_are_storage_errors() {
        let err = map_sqlx_error("fetch_recent", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Storage(msg) if msg.contains("fetch_recent")));
    }
}
