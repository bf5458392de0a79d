use serde::{Deserialize, Serialize};

/// Role a party plays on the waybill.
///
/// The prefix is the column/JSON key stem used by every schema revision
/// (`remitente`, `remitente_nombre`, `remitente_ciudad`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Carrier,
    Consignor,
    Recipient,
    Consignee,
    Notify,
}

impl PartyRole {
    pub const ALL: [PartyRole; 5] = [
        PartyRole::Carrier,
        PartyRole::Consignor,
        PartyRole::Recipient,
        PartyRole::Consignee,
        PartyRole::Notify,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            PartyRole::Carrier => "transportadora",
            PartyRole::Consignor => "remitente",
            PartyRole::Recipient => "destinatario",
            PartyRole::Consignee => "consignatario",
            PartyRole::Notify => "notificar_a",
        }
    }
}

/// Detailed party attributes carried next to the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyAttribute {
    Name,
    Address,
    Document,
    DocumentType,
    Phone,
    City,
    Country,
}

impl PartyAttribute {
    pub const ALL: [PartyAttribute; 7] = [
        PartyAttribute::Name,
        PartyAttribute::Address,
        PartyAttribute::Document,
        PartyAttribute::DocumentType,
        PartyAttribute::Phone,
        PartyAttribute::City,
        PartyAttribute::Country,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            PartyAttribute::Name => "nombre",
            PartyAttribute::Address => "direccion",
            PartyAttribute::Document => "documento",
            PartyAttribute::DocumentType => "tipo_documento",
            PartyAttribute::Phone => "telefono",
            PartyAttribute::City => "ciudad",
            PartyAttribute::Country => "pais",
        }
    }

    /// Flat column key for this attribute of `role`, e.g. `remitente_ciudad`.
    pub fn column(self, role: PartyRole) -> String {
        format!("{}_{}", role.prefix(), self.suffix())
    }
}

/// A resolved party. Missing relations leave fields empty, never absent.
///
/// There is exactly one name. The short display alias (`remitente`) and
/// the detailed field (`remitente_nombre`) are both projected from it, so
/// they cannot disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    pub address: String,
    pub document: String,
    pub document_type: String,
    pub phone: String,
    pub city: String,
    pub country: String,
}

impl Party {
    /// The short alias older consumers read.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, attr: PartyAttribute) -> &str {
        match attr {
            PartyAttribute::Name => &self.name,
            PartyAttribute::Address => &self.address,
            PartyAttribute::Document => &self.document,
            PartyAttribute::DocumentType => &self.document_type,
            PartyAttribute::Phone => &self.phone,
            PartyAttribute::City => &self.city,
            PartyAttribute::Country => &self.country,
        }
    }

    pub(crate) fn attribute_mut(&mut self, attr: PartyAttribute) -> &mut String {
        match attr {
            PartyAttribute::Name => &mut self.name,
            PartyAttribute::Address => &mut self.address,
            PartyAttribute::Document => &mut self.document,
            PartyAttribute::DocumentType => &mut self.document_type,
            PartyAttribute::Phone => &mut self.phone,
            PartyAttribute::City => &mut self.city,
            PartyAttribute::Country => &mut self.country,
        }
    }

    pub fn is_empty(&self) -> bool {
        PartyAttribute::ALL.iter().all(|a| self.attribute(*a).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_follow_prefix_and_suffix() {
        assert_eq!(PartyAttribute::City.column(PartyRole::Consignor), "remitente_ciudad");
        assert_eq!(
            PartyAttribute::DocumentType.column(PartyRole::Notify),
            "notificar_a_tipo_documento"
        );
    }

    #[test]
    fn display_name_is_the_detailed_name() {
        let party = Party {
            name: "Transportes del Este S.A.".to_string(),
            ..Party::default()
        };
        assert_eq!(party.display_name(), party.attribute(PartyAttribute::Name));
    }

    #[test]
    fn default_party_is_empty() {
        assert!(Party::default().is_empty());
    }
}
