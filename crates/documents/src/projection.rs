//! Flat JSON projection of [`CrtDocument`].
//!
//! Downstream consumers read a single flat object: scalar fields by their
//! canonical key, every party as `<prefix>` (display alias) plus
//! `<prefix>_<attribute>` detail keys, and the charge lines under `gastos`.
//! Fields with an older list-view key (`declaracion_mercaderia`) are emitted
//! under both keys with equal values.
//! Decoding accepts numbers where text is expected and treats missing keys
//! and `null` as empty.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use cartaporte_core::DomainError;

use crate::document::CrtDocument;
use crate::field::CanonicalField;
use crate::party::{PartyAttribute, PartyRole};

/// Build a document from a column lookup.
///
/// Shared by row resolution and JSON decoding so both honor the same
/// aliasing rules: a party's name is its detailed name when one is present,
/// otherwise its display alias; a field with a list-view alias takes the
/// canonical key when non-empty, otherwise the alias.
pub(crate) fn assemble<E>(
    id: i64,
    mut column: impl FnMut(&str) -> Result<Option<String>, E>,
) -> Result<CrtDocument, E> {
    let mut doc = CrtDocument {
        id,
        ..CrtDocument::default()
    };

    for field in CanonicalField::ALL {
        let mut value = column(field.key())?;
        if let Some(alias) = field.list_alias() {
            if value.as_deref().is_none_or(str::is_empty) {
                value = column(alias)?.or(value);
            }
        }
        if let Some(value) = value {
            *field.value_mut(&mut doc) = value;
        }
    }

    for role in PartyRole::ALL {
        let party = doc.parties.get_mut(role);
        for attr in PartyAttribute::ALL {
            let Some(value) = column(&attr.column(role))? else {
                continue;
            };
            if attr == PartyAttribute::Name && value.is_empty() {
                continue;
            }
            *party.attribute_mut(attr) = value;
        }
    }

    Ok(doc)
}

impl CrtDocument {
    /// Decode the flat projection.
    pub fn from_flat(map: &Map<String, Value>) -> Result<Self, DomainError> {
        let id = match map.get("id") {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| DomainError::malformed("`id` must be an integer"))?,
            Some(Value::String(s)) if s.trim().is_empty() => 0,
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| DomainError::malformed("`id` must be an integer"))?,
            Some(_) => return Err(DomainError::malformed("`id` must be an integer")),
        };

        let mut doc = assemble(id, |key| {
            map.get(key).map(|v| text_value(key, v)).transpose()
        })?;

        doc.charges = match map.get("gastos") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| DomainError::malformed(format!("`gastos`: {e}")))?,
        };

        Ok(doc)
    }
}

fn text_value(key: &str, value: &Value) -> Result<String, DomainError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(DomainError::malformed(format!(
            "`{key}` must be a string or a number"
        ))),
    }
}

/// Accept a JSON string, number or null as text.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    text_value("amount", &value).map_err(D::Error::custom)
}

impl Serialize for CrtDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        for field in CanonicalField::ALL {
            map.serialize_entry(field.key(), field.value(self))?;
            if let Some(alias) = field.list_alias() {
                map.serialize_entry(alias, field.value(self))?;
            }
        }
        for role in PartyRole::ALL {
            let party = self.parties.get(role);
            for attr in PartyAttribute::ALL {
                map.serialize_entry(&attr.column(role), party.attribute(attr))?;
            }
        }
        map.serialize_entry("gastos", &self.charges)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for CrtDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        CrtDocument::from_flat(&map).map_err(D::Error::custom)
    }
}
