//! The canonical CRT document.

use serde::{Deserialize, Serialize};

use crate::party::{Party, PartyRole};

/// The single, schema-stable representation of a CRT and all its resolved
/// relations.
///
/// Every text field is present; absent relations and NULL columns resolve to
/// empty strings. Numeric columns are carried as their decimal text so the
/// shape has exactly one type per field. Values are built whole (by
/// [`crate::resolve`] or by decoding a flat JSON projection) and not patched
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrtDocument {
    pub id: i64,
    pub waybill_number: String,
    pub status: String,
    pub issue_date: String,
    pub issue_place: String,
    pub carrier_takeover: String,
    pub delivery_terms: String,
    pub delivery_place: String,
    pub successive_carriers: String,
    pub cargo_description: String,
    pub gross_weight: String,
    pub net_weight: String,
    pub volume: String,
    pub incoterm_value: String,
    pub currency: String,
    /// Currency name (`monedas.nombre`); `currency` is the code.
    pub currency_name: String,
    pub incoterm: String,
    pub goods_value: String,
    pub declared_value: String,
    pub export_invoice: String,
    pub dispatch_number: String,
    pub customs_instructions: String,
    pub external_freight: String,
    pub refund_value: String,
    pub observations: String,
    pub parties: Parties,
    pub signatures: Signatures,
    pub charges: Vec<ChargeLine>,
}

/// One party per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parties {
    pub carrier: Party,
    pub consignor: Party,
    pub recipient: Party,
    pub consignee: Party,
    pub notify: Party,
}

impl Parties {
    pub fn get(&self, role: PartyRole) -> &Party {
        match role {
            PartyRole::Carrier => &self.carrier,
            PartyRole::Consignor => &self.consignor,
            PartyRole::Recipient => &self.recipient,
            PartyRole::Consignee => &self.consignee,
            PartyRole::Notify => &self.notify,
        }
    }

    pub(crate) fn get_mut(&mut self, role: PartyRole) -> &mut Party {
        match role {
            PartyRole::Carrier => &mut self.carrier,
            PartyRole::Consignor => &mut self.consignor,
            PartyRole::Recipient => &mut self.recipient,
            PartyRole::Consignee => &mut self.consignee,
            PartyRole::Notify => &mut self.notify,
        }
    }
}

/// Signer name and date for one signing role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub signer: String,
    pub date: String,
}

/// Signature blocks of the roles that sign the paper form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    pub consignor: Signature,
    pub carrier: Signature,
    pub recipient: Signature,
}

/// A per-leg freight charge (`crt_gastos`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeLine {
    #[serde(rename = "tramo")]
    pub leg: String,
    #[serde(rename = "valor_remitente", deserialize_with = "crate::projection::lenient_text")]
    pub consignor_amount: String,
    #[serde(rename = "moneda_remitente")]
    pub consignor_currency: String,
    #[serde(rename = "valor_destinatario", deserialize_with = "crate::projection::lenient_text")]
    pub recipient_amount: String,
    #[serde(rename = "moneda_destinatario")]
    pub recipient_currency: String,
}
