//! In-memory CRT store.
//!
//! Holds the same normalized tables the Postgres schema has and performs the
//! left joins in Rust, projecting rows the way the configured schema revision
//! would. Intended for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use cartaporte_core::{CrtId, WaybillNumber};
use cartaporte_documents::{ChargeLine, PartyAttribute, PartyRole, RawCrtRow};

use super::schema::SchemaRevision;
use super::{CrtStore, NO_ROWS, StoreError};

/// Scalar crt columns the legacy revision exposes.
const LEGACY_COLUMNS: &[&str] = &[
    "estado",
    "fecha_emision",
    "lugar_entrega",
    "transporte_sucesivos",
    "detalles_mercaderia",
    "peso_bruto",
    "peso_neto",
    "volumen",
    "valor",
    "incoterm",
    "valor_mercaderia",
    "declaracion_valor_mercaderia",
    "factura_exportacion",
    "nro_despacho",
    "valor_flete_externo",
    "valor_reembolso",
    "observaciones",
];

/// A `transportadoras` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carrier {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub document: Option<String>,
    pub document_type: Option<String>,
    pub phone: Option<String>,
    pub city_id: Option<i64>,
}

/// A `remitentes` row; consignors, recipients, consignees and notify parties
/// all live in this table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyRecord {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub document: Option<String>,
    pub document_type: Option<String>,
    pub city_id: Option<i64>,
}

/// A `crts` row. `columns` holds scalar values under their canonical keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrtRecord {
    pub id: i64,
    pub numero_crt: String,
    pub carrier_id: Option<i64>,
    pub consignor_id: Option<i64>,
    pub recipient_id: Option<i64>,
    pub consignee_id: Option<i64>,
    pub notify_id: Option<i64>,
    pub currency_id: Option<i64>,
    pub columns: BTreeMap<String, String>,
}

impl CrtRecord {
    pub fn new(id: i64, numero_crt: impl Into<String>) -> Self {
        Self {
            id,
            numero_crt: numero_crt.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    fn party_id(&self, role: PartyRole) -> Option<i64> {
        match role {
            PartyRole::Carrier => self.carrier_id,
            PartyRole::Consignor => self.consignor_id,
            PartyRole::Recipient => self.recipient_id,
            PartyRole::Consignee => self.consignee_id,
            PartyRole::Notify => self.notify_id,
        }
    }
}

/// A `crt_gastos` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargeRecord {
    pub crt_id: i64,
    pub leg: String,
    pub consignor_amount: Option<String>,
    pub consignor_currency_id: Option<i64>,
    pub recipient_amount: Option<String>,
    pub recipient_currency_id: Option<i64>,
}

#[derive(Debug, Default)]
struct Tables {
    countries: HashMap<i64, String>,
    cities: HashMap<i64, (String, i64)>,
    /// id → (code, name)
    currencies: HashMap<i64, (String, String)>,
    carriers: HashMap<i64, Carrier>,
    parties: HashMap<i64, PartyRecord>,
    crts: BTreeMap<i64, CrtRecord>,
    charges: Vec<ChargeRecord>,
}

/// Party detail after the city → country joins.
struct JoinedParty<'a> {
    name: &'a str,
    address: Option<&'a str>,
    document: Option<&'a str>,
    document_type: Option<&'a str>,
    phone: Option<&'a str>,
    city: Option<&'a str>,
    country: Option<&'a str>,
}

impl Tables {
    fn location(&self, city_id: Option<i64>) -> (Option<&str>, Option<&str>) {
        let Some((city, country_id)) = city_id.and_then(|id| self.cities.get(&id)) else {
            return (None, None);
        };
        (
            Some(city.as_str()),
            self.countries.get(country_id).map(String::as_str),
        )
    }

    fn currency(&self, id: Option<i64>) -> Option<&str> {
        id.and_then(|id| self.currencies.get(&id)).map(|(code, _)| code.as_str())
    }

    fn currency_name(&self, id: Option<i64>) -> Option<&str> {
        id.and_then(|id| self.currencies.get(&id)).map(|(_, name)| name.as_str())
    }

    fn party(&self, role: PartyRole, id: Option<i64>) -> Option<JoinedParty<'_>> {
        let id = id?;
        if role == PartyRole::Carrier {
            let c = self.carriers.get(&id)?;
            let (city, country) = self.location(c.city_id);
            return Some(JoinedParty {
                name: &c.name,
                address: c.address.as_deref(),
                document: c.document.as_deref(),
                document_type: c.document_type.as_deref(),
                phone: c.phone.as_deref(),
                city,
                country,
            });
        }
        let p = self.parties.get(&id)?;
        let (city, country) = self.location(p.city_id);
        Some(JoinedParty {
            name: &p.name,
            address: p.address.as_deref(),
            document: p.document.as_deref(),
            document_type: p.document_type.as_deref(),
            phone: None,
            city,
            country,
        })
    }

    fn project(&self, record: &CrtRecord, revision: SchemaRevision) -> RawCrtRow {
        let mut row = RawCrtRow::new(record.id);
        row.set("numero_crt", Some(record.numero_crt.clone()));
        row.set("moneda", self.currency(record.currency_id).map(str::to_string));
        row.set("moneda_nombre", self.currency_name(record.currency_id).map(str::to_string));

        match revision {
            SchemaRevision::Legacy => {
                for (column, value) in &record.columns {
                    if LEGACY_COLUMNS.contains(&column.as_str()) {
                        row.set(column.as_str(), Some(value.clone()));
                    }
                }
                for role in PartyRole::ALL {
                    if role == PartyRole::Notify {
                        continue;
                    }
                    let name = self.party(role, record.party_id(role)).map(|p| p.name.to_string());
                    row.set(role.prefix(), name);
                }
            }
            SchemaRevision::Normalized | SchemaRevision::Auto => {
                for (column, value) in &record.columns {
                    row.set(column.as_str(), Some(value.clone()));
                }
                for role in PartyRole::ALL {
                    let Some(p) = self.party(role, record.party_id(role)) else {
                        continue;
                    };
                    let attrs = [
                        (PartyAttribute::Name, Some(p.name)),
                        (PartyAttribute::Address, p.address),
                        (PartyAttribute::Document, p.document),
                        (PartyAttribute::DocumentType, p.document_type),
                        (PartyAttribute::Phone, p.phone),
                        (PartyAttribute::City, p.city),
                        (PartyAttribute::Country, p.country),
                    ];
                    for (attr, value) in attrs {
                        row.set(attr.column(role), value.map(str::to_string));
                    }
                    let signer = match role {
                        PartyRole::Consignor => Some("firma_remitente"),
                        PartyRole::Carrier => Some("firma_transportador"),
                        PartyRole::Recipient => Some("firma_destinatario"),
                        _ => None,
                    };
                    if let Some(column) = signer {
                        if row.get(column).is_none() {
                            row.set(column, Some(p.name.to_string()));
                        }
                    }
                }
                row.charges = self
                    .charges
                    .iter()
                    .filter(|g| g.crt_id == record.id)
                    .map(|g| ChargeLine {
                        leg: g.leg.clone(),
                        consignor_amount: g.consignor_amount.clone().unwrap_or_default(),
                        consignor_currency: self
                            .currency(g.consignor_currency_id)
                            .unwrap_or_default()
                            .to_string(),
                        recipient_amount: g.recipient_amount.clone().unwrap_or_default(),
                        recipient_currency: self
                            .currency(g.recipient_currency_id)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect();
            }
        }
        row
    }
}

/// In-memory CRT store for tests/dev.
#[derive(Debug)]
pub struct InMemoryCrtStore {
    revision: SchemaRevision,
    tables: RwLock<Tables>,
}

impl Default for InMemoryCrtStore {
    fn default() -> Self {
        Self::new(SchemaRevision::Normalized)
    }
}

impl InMemoryCrtStore {
    /// `Auto` projects like `Normalized`: the in-memory tables always carry
    /// full detail.
    pub fn new(revision: SchemaRevision) -> Self {
        let revision = match revision {
            SchemaRevision::Auto => SchemaRevision::Normalized,
            fixed => fixed,
        };
        Self {
            revision,
            tables: RwLock::new(Tables::default()),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    pub fn insert_country(&self, id: i64, name: impl Into<String>) {
        self.write().countries.insert(id, name.into());
    }

    pub fn insert_city(&self, id: i64, name: impl Into<String>, country_id: i64) {
        self.write().cities.insert(id, (name.into(), country_id));
    }

    pub fn insert_currency(&self, id: i64, code: impl Into<String>, name: impl Into<String>) {
        self.write().currencies.insert(id, (code.into(), name.into()));
    }

    pub fn insert_carrier(&self, carrier: Carrier) {
        self.write().carriers.insert(carrier.id, carrier);
    }

    pub fn insert_party(&self, party: PartyRecord) {
        self.write().parties.insert(party.id, party);
    }

    pub fn insert_crt(&self, crt: CrtRecord) {
        self.write().crts.insert(crt.id, crt);
    }

    pub fn insert_charge(&self, charge: ChargeRecord) {
        self.write().charges.push(charge);
    }

    /// A small data set for running the service without a database.
    pub fn with_sample_data(revision: SchemaRevision) -> Self {
        let store = Self::new(revision);
        store.insert_country(1, "Paraguay");
        store.insert_country(2, "Argentina");
        store.insert_city(1, "Asunción", 1);
        store.insert_city(2, "Buenos Aires", 2);
        store.insert_currency(1, "USD", "Dólar estadounidense");
        store.insert_carrier(Carrier {
            id: 1,
            name: "Transportes del Chaco S.A.".into(),
            address: Some("Av. Mcal. López 1234".into()),
            document: Some("80012345-6".into()),
            document_type: Some("RUC".into()),
            phone: Some("+595 21 555 000".into()),
            city_id: Some(1),
        });
        store.insert_party(PartyRecord {
            id: 1,
            name: "Exportadora Guaraní S.R.L.".into(),
            address: Some("Ruta 2 km 20".into()),
            document: Some("80098765-4".into()),
            document_type: Some("RUC".into()),
            city_id: Some(1),
        });
        store.insert_party(PartyRecord {
            id: 2,
            name: "Importadora del Plata S.A.".into(),
            address: Some("Av. Corrientes 500".into()),
            document: Some("30-71234567-8".into()),
            document_type: Some("CUIT".into()),
            city_id: Some(2),
        });
        store.insert_crt(CrtRecord {
            carrier_id: Some(1),
            consignor_id: Some(1),
            recipient_id: Some(2),
            consignee_id: Some(2),
            notify_id: Some(2),
            currency_id: Some(1),
            ..CrtRecord::new(1, "PY000000001")
                .with("estado", "EMITIDO")
                .with("fecha_emision", "2024-03-01")
                .with("lugar_emision", "Asunción - Paraguay")
                .with("detalles_mercaderia", "20 pallets de yerba mate")
                .with("peso_bruto", "12000.000")
                .with("peso_neto", "11500.000")
                .with("incoterm", "FCA")
                .with("valor", "18500.00")
        });
        store.insert_charge(ChargeRecord {
            crt_id: 1,
            leg: "Flete Asunción - Buenos Aires".into(),
            consignor_amount: Some("1500.00".into()),
            consignor_currency_id: Some(1),
            recipient_amount: None,
            recipient_currency_id: None,
        });
        store
    }

    fn find(&self, predicate: impl Fn(&CrtRecord) -> bool) -> Result<RawCrtRow, StoreError> {
        let tables = self.read()?;
        tables
            .crts
            .values()
            .find(|c| predicate(*c))
            .map(|c| tables.project(c, self.revision))
            .ok_or_else(|| StoreError::NotFound(NO_ROWS.to_string()))
    }
}

#[async_trait]
impl CrtStore for InMemoryCrtStore {
    fn revision(&self) -> SchemaRevision {
        self.revision
    }

    async fn fetch_by_id(&self, id: CrtId) -> Result<RawCrtRow, StoreError> {
        self.find(|c| c.id == id.get())
    }

    async fn fetch_by_number(&self, number: &WaybillNumber) -> Result<RawCrtRow, StoreError> {
        self.find(|c| c.numero_crt == number.as_str())
    }

    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawCrtRow>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .crts
            .values()
            .rev()
            .take(limit as usize)
            .map(|c| tables.project(c, self.revision))
            .collect())
    }

    async fn latest_number(
        &self,
        carrier_id: i64,
        prefix: &str,
        len: usize,
    ) -> Result<Option<String>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .crts
            .values()
            .filter(|c| c.carrier_id == Some(carrier_id))
            .map(|c| c.numero_crt.as_str())
            .filter(|n| n.starts_with(prefix) && n.len() == len)
            .max()
            .map(str::to_string))
    }
}
