//! Named text fields of the canonical document.
//!
//! Each field has one flat key shared by the JSON projection, the raw row
//! columns, and the layout table.

use crate::document::CrtDocument;

macro_rules! canonical_fields {
    ($( $variant:ident => $key:literal, printed: $printed:literal, $($field:ident).+ ; )*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CanonicalField {
            $($variant,)*
        }

        impl CanonicalField {
            /// Every text field, in projection order.
            pub const ALL: &'static [CanonicalField] = &[$(CanonicalField::$variant,)*];

            pub fn key(self) -> &'static str {
                match self {
                    $(CanonicalField::$variant => $key,)*
                }
            }

            /// Whether the paper form has a place for this field.
            pub fn is_printed(self) -> bool {
                match self {
                    $(CanonicalField::$variant => $printed,)*
                }
            }

            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some(CanonicalField::$variant),)*
                    _ => None,
                }
            }

            pub fn value(self, doc: &CrtDocument) -> &str {
                match self {
                    $(CanonicalField::$variant => doc.$($field).+.as_str(),)*
                }
            }

            pub(crate) fn value_mut(self, doc: &mut CrtDocument) -> &mut String {
                match self {
                    $(CanonicalField::$variant => &mut doc.$($field).+,)*
                }
            }
        }
    };
}

canonical_fields! {
    WaybillNumber => "numero_crt", printed: true, waybill_number;
    Status => "estado", printed: false, status;
    IssueDate => "fecha_emision", printed: true, issue_date;
    IssuePlace => "lugar_emision", printed: true, issue_place;
    Carrier => "transportadora", printed: true, parties.carrier.name;
    Consignor => "remitente", printed: true, parties.consignor.name;
    Recipient => "destinatario", printed: true, parties.recipient.name;
    Consignee => "consignatario", printed: true, parties.consignee.name;
    Notify => "notificar_a", printed: true, parties.notify.name;
    CarrierTakeover => "lugar_pais_fecha_transportador", printed: true, carrier_takeover;
    DeliveryTerms => "lugar_pais_plazo_entrega", printed: true, delivery_terms;
    DeliveryPlace => "lugar_entrega", printed: false, delivery_place;
    SuccessiveCarriers => "transporte_sucesivos", printed: true, successive_carriers;
    CargoDescription => "detalles_mercaderia", printed: true, cargo_description;
    GrossWeight => "peso_bruto", printed: true, gross_weight;
    NetWeight => "peso_neto", printed: true, net_weight;
    Volume => "volumen", printed: true, volume;
    IncotermValue => "valor", printed: true, incoterm_value;
    Currency => "moneda", printed: true, currency;
    CurrencyName => "moneda_nombre", printed: false, currency_name;
    Incoterm => "incoterm", printed: true, incoterm;
    GoodsValue => "valor_mercaderia", printed: false, goods_value;
    DeclaredValue => "declaracion_valor_mercaderia", printed: true, declared_value;
    ExportInvoice => "factura_exportacion", printed: true, export_invoice;
    DispatchNumber => "nro_despacho", printed: true, dispatch_number;
    CustomsInstructions => "instrucciones_aduana", printed: true, customs_instructions;
    ExternalFreight => "valor_flete_externo", printed: true, external_freight;
    RefundValue => "valor_reembolso", printed: true, refund_value;
    Observations => "observaciones", printed: true, observations;
    ConsignorSigner => "firma_remitente", printed: true, signatures.consignor.signer;
    ConsignorSignedOn => "fecha_firma_remitente", printed: true, signatures.consignor.date;
    CarrierSigner => "firma_transportador", printed: true, signatures.carrier.signer;
    CarrierSignedOn => "fecha_firma_transportador", printed: true, signatures.carrier.date;
    RecipientSigner => "firma_destinatario", printed: true, signatures.recipient.signer;
    RecipientSignedOn => "fecha_firma_destinatario", printed: true, signatures.recipient.date;
}

impl CanonicalField {
    /// Fields the printed form must place somewhere.
    pub fn printed() -> impl Iterator<Item = CanonicalField> {
        Self::ALL.iter().copied().filter(|f| f.is_printed())
    }

    /// Older list-view key carrying the same value, if any.
    ///
    /// Both keys are projected; on input the canonical key wins when it is
    /// non-empty, otherwise the alias is used.
    pub fn list_alias(self) -> Option<&'static str> {
        match self {
            CanonicalField::DeclaredValue => Some("declaracion_mercaderia"),
            _ => None,
        }
    }

    /// The party whose display name this field projects, if any.
    pub fn party_role(self) -> Option<crate::party::PartyRole> {
        use crate::party::PartyRole;
        match self {
            CanonicalField::Carrier => Some(PartyRole::Carrier),
            CanonicalField::Consignor => Some(PartyRole::Consignor),
            CanonicalField::Recipient => Some(PartyRole::Recipient),
            CanonicalField::Consignee => Some(PartyRole::Consignee),
            CanonicalField::Notify => Some(PartyRole::Notify),
            _ => None,
        }
    }
}

impl core::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::party::PartyRole;
    use std::collections::HashSet;

    #[test]
    fn keys_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for field in CanonicalField::ALL {
            assert!(seen.insert(field.key()), "duplicate key {}", field.key());
            assert_eq!(CanonicalField::from_key(field.key()), Some(*field));
        }
    }

    #[test]
    fn party_display_fields_use_the_role_prefix() {
        for field in CanonicalField::ALL {
            if let Some(role) = field.party_role() {
                assert_eq!(field.key(), role.prefix());
            }
        }
        assert_eq!(
            CanonicalField::ALL.iter().filter(|f| f.party_role().is_some()).count(),
            PartyRole::ALL.len()
        );
    }

    #[test]
    fn list_aliases_never_clash_with_canonical_keys() {
        for field in CanonicalField::ALL {
            if let Some(alias) = field.list_alias() {
                assert_eq!(CanonicalField::from_key(alias), None);
            }
        }
        assert_eq!(
            CanonicalField::DeclaredValue.list_alias(),
            Some("declaracion_mercaderia")
        );
    }

    #[test]
    fn value_reads_nested_party_name() {
        let mut doc = CrtDocument::default();
        doc.parties.notify.name = "Agencia Norte".to_string();
        assert_eq!(CanonicalField::Notify.value(&doc), "Agencia Norte");
    }

    #[test]
    fn printed_set_excludes_list_only_fields() {
        let printed: Vec<_> = CanonicalField::printed().collect();
        assert!(!printed.contains(&CanonicalField::Status));
        assert!(!printed.contains(&CanonicalField::GoodsValue));
        assert!(!printed.contains(&CanonicalField::CurrencyName));
        assert_eq!(printed.len(), 31);
    }
}
