//! Aggregation resolver: selector → canonical document.
//!
//! Stateless and uncached; every call reads fresh rows from the store and
//! resolves them. No retries.

use thiserror::Error;
use tracing::debug;

use cartaporte_core::{DomainError, Selector, WaybillNumber};
use cartaporte_documents::{
    CrtDocument, WAYBILL_DIGITS, WAYBILL_PREFIX, next_waybill_number, parse_seed, resolve,
};

use crate::store::{CrtStore, NO_ROWS, StoreError};

/// Size of the recent-documents window.
pub const LIST_WINDOW: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{entity} no encontrado: {detail}")]
    NotFound { entity: &'static str, detail: String },

    #[error(transparent)]
    InvalidInput(#[from] DomainError),

    #[error("{0}")]
    Storage(String),
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(detail) => ResolveError::NotFound {
                entity: "CRT",
                detail,
            },
            StoreError::Storage(msg) => ResolveError::Storage(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrtResolver<S> {
    store: S,
}

impl<S: CrtStore> CrtResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Exactly one document for a selector, or `NotFound`.
    pub async fn get(&self, selector: &Selector) -> Result<CrtDocument, ResolveError> {
        let row = match selector {
            Selector::Id(id) => self.store.fetch_by_id(*id).await?,
            Selector::Number(number) => self.store.fetch_by_number(number).await?,
            Selector::UnmatchableId(_) => {
                return Err(StoreError::NotFound(NO_ROWS.to_string()).into());
            }
        };
        debug!(selector = %selector, revision = %self.store.revision(), "resolved crt");
        Ok(resolve(row))
    }

    /// The newest `LIST_WINDOW` documents, by descending id.
    pub async fn list_recent(&self) -> Result<Vec<CrtDocument>, ResolveError> {
        let rows = self.store.fetch_recent(LIST_WINDOW).await?;
        debug!(count = rows.len(), "resolved recent crts");
        Ok(rows.into_iter().map(resolve).collect())
    }

    /// Next sequential waybill number for a carrier.
    ///
    /// The seed is validated before storage is touched.
    pub async fn next_number(
        &self,
        carrier_id: i64,
        seed: &str,
    ) -> Result<WaybillNumber, ResolveError> {
        parse_seed(seed)?;
        let latest = self
            .store
            .latest_number(carrier_id, WAYBILL_PREFIX, WAYBILL_PREFIX.len() + WAYBILL_DIGITS)
            .await?;
        Ok(next_waybill_number(seed, latest.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        Carrier, CrtRecord, InMemoryCrtStore, PartyRecord, SchemaRevision,
    };
    use cartaporte_core::CrtId;
    use cartaporte_documents::PartyRole;

    fn resolver(store: InMemoryCrtStore) -> CrtResolver<InMemoryCrtStore> {
        CrtResolver::new(store)
    }

    fn with_ids(ids: &[i64]) -> InMemoryCrtStore {
        let store = InMemoryCrtStore::default();
        for id in ids {
            store.insert_crt(CrtRecord::new(*id, format!("PY{id:09}")));
        }
        store
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let r = resolver(with_ids(&[5, 3, 9, 1]));
        let ids: Vec<i64> = r.list_recent().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![9, 5, 3, 1]);
    }

    #[tokio::test]
    async fn list_is_capped_at_the_window() {
        let ids: Vec<i64> = (1..=30).collect();
        let r = resolver(with_ids(&ids));
        let docs = r.list_recent().await.unwrap();
        assert_eq!(docs.len(), LIST_WINDOW as usize);
        assert_eq!(docs[0].id, 30);
        assert_eq!(docs[19].id, 11);
    }

    #[tokio::test]
    async fn get_by_id_matches_list_entry() {
        let r = resolver(InMemoryCrtStore::with_sample_data(SchemaRevision::Normalized));
        for listed in r.list_recent().await.unwrap() {
            let selector = Selector::Id(CrtId::new(listed.id).unwrap());
            assert_eq!(r.get(&selector).await.unwrap(), listed);
        }
    }

    #[tokio::test]
    async fn unknown_selector_is_not_found() {
        let r = resolver(with_ids(&[1]));
        let err = r.get(&"999999".parse().unwrap()).await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFound {
                entity: "CRT",
                detail: NO_ROWS.to_string()
            }
        );
        assert_eq!(err.to_string(), format!("CRT no encontrado: {NO_ROWS}"));
    }

    #[tokio::test]
    async fn out_of_range_ids_are_not_found() {
        let r = resolver(with_ids(&[1]));
        for raw in ["0", "99999999999999999999"] {
            let err = r.get(&raw.parse().unwrap()).await.unwrap_err();
            assert_eq!(err.to_string(), format!("CRT no encontrado: {NO_ROWS}"));
        }
    }

    #[tokio::test]
    async fn waybill_selector_resolves_by_number() {
        let r = resolver(with_ids(&[4, 8]));
        let doc = r.get(&"PY000000008".parse().unwrap()).await.unwrap();
        assert_eq!(doc.id, 8);
    }

    #[tokio::test]
    async fn absent_carrier_yields_empty_fields() {
        let store = InMemoryCrtStore::default();
        store.insert_crt(CrtRecord {
            carrier_id: Some(77),
            ..CrtRecord::new(1, "PY000000001")
        });
        let doc = resolver(store).get(&"1".parse().unwrap()).await.unwrap();
        let carrier = doc.parties.get(PartyRole::Carrier);
        assert!(carrier.is_empty());
        assert_eq!(carrier.name, "");
        assert_eq!(carrier.city, "");
    }

    #[tokio::test]
    async fn legacy_and_normalized_agree_on_names() {
        let legacy = resolver(InMemoryCrtStore::with_sample_data(SchemaRevision::Legacy));
        let normalized = resolver(InMemoryCrtStore::with_sample_data(SchemaRevision::Normalized));
        let selector: Selector = "1".parse().unwrap();
        let a = legacy.get(&selector).await.unwrap();
        let b = normalized.get(&selector).await.unwrap();
        for role in [
            PartyRole::Carrier,
            PartyRole::Consignor,
            PartyRole::Recipient,
            PartyRole::Consignee,
        ] {
            assert_eq!(a.parties.get(role).name, b.parties.get(role).name);
            assert!(!a.parties.get(role).name.is_empty());
        }
        // Legacy has no notify relation.
        assert!(a.parties.get(PartyRole::Notify).is_empty());
    }

    #[tokio::test]
    async fn next_number_increments_carrier_sequence() {
        let store = InMemoryCrtStore::default();
        store.insert_carrier(Carrier {
            id: 3,
            name: "Trans Sur".into(),
            ..Carrier::default()
        });
        store.insert_party(PartyRecord {
            id: 1,
            name: "X".into(),
            ..PartyRecord::default()
        });
        store.insert_crt(CrtRecord {
            carrier_id: Some(3),
            ..CrtRecord::new(1, "PY000000041")
        });
        let r = resolver(store);
        assert_eq!(r.next_number(3, "PY000000001").await.unwrap().as_str(), "PY000000042");
        assert_eq!(r.next_number(4, "PY000000100").await.unwrap().as_str(), "PY000000100");
    }

    #[tokio::test]
    async fn invalid_seed_is_rejected() {
        let r = resolver(InMemoryCrtStore::default());
        let err = r.next_number(1, "AR123").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput(_)));
    }
}
