//! Declarative layout of the CRT paper form.
//!
//! Each entry is one single-line text cell at a fixed anchor. Values are
//! written verbatim: no wrapping, clipping or overflow handling.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use cartaporte_documents::{CanonicalField, CrtDocument};

use crate::units::Anchor;

/// Form sections, in the order the renderer visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Header,
    Parties,
    Cargo,
    Value,
    Customs,
    Signatures,
}

impl Section {
    pub const ORDER: [Section; 6] = [
        Section::Header,
        Section::Parties,
        Section::Cargo,
        Section::Value,
        Section::Customs,
        Section::Signatures,
    ];
}

/// Part of a composite cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    Text(&'static str),
    Field(CanonicalField),
}

/// What a cell prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Field(CanonicalField),
    /// Plain concatenation of literal text and field values.
    Composite(&'static [Piece]),
}

impl Cell {
    pub fn fields(&self) -> Vec<CanonicalField> {
        match self {
            Cell::Field(f) => vec![*f],
            Cell::Composite(pieces) => pieces
                .iter()
                .filter_map(|p| match p {
                    Piece::Field(f) => Some(*f),
                    Piece::Text(_) => None,
                })
                .collect(),
        }
    }

    pub fn text(&self, doc: &CrtDocument) -> String {
        match self {
            Cell::Field(f) => f.value(doc).to_string(),
            Cell::Composite(pieces) => {
                let mut out = String::new();
                for piece in pieces.iter() {
                    match piece {
                        Piece::Text(t) => out.push_str(t),
                        Piece::Field(f) => out.push_str(f.value(doc)),
                    }
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEntry {
    pub key: &'static str,
    pub section: Section,
    pub anchor: Anchor,
    pub cell: Cell,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("layout does not place printed fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("duplicate layout key: {0}")]
    DuplicateKey(&'static str),

    #[error("anchor for {key} is off the A4 sheet: ({x_mm} mm, {y_mm} mm)")]
    OffSheet {
        key: &'static str,
        x_mm: f64,
        y_mm: f64,
    },
}

use Piece::{Field as F, Text as T};

const fn entry(key: &'static str, section: Section, x_mm: f64, y_mm: f64, cell: Cell) -> LayoutEntry {
    LayoutEntry {
        key,
        section,
        anchor: Anchor::mm(x_mm, y_mm),
        cell,
    }
}

/// Anchors of the standard bilingual CRT form, box by box.
const STANDARD: &[LayoutEntry] = &[
    // box 2, box 5
    entry("numero_crt", Section::Header, 108.0, 35.0, Cell::Field(CanonicalField::WaybillNumber)),
    entry("lugar_emision", Section::Header, 108.0, 64.5, Cell::Field(CanonicalField::IssuePlace)),
    entry("fecha_emision", Section::Header, 165.0, 64.5, Cell::Field(CanonicalField::IssueDate)),
    // boxes 1, 3, 4, 6, 9
    entry("remitente", Section::Parties, 14.0, 35.0, Cell::Field(CanonicalField::Consignor)),
    entry("transportadora", Section::Parties, 108.0, 41.5, Cell::Field(CanonicalField::Carrier)),
    entry("destinatario", Section::Parties, 14.0, 57.0, Cell::Field(CanonicalField::Recipient)),
    entry("consignatario", Section::Parties, 14.0, 78.0, Cell::Field(CanonicalField::Consignee)),
    entry("notificar_a", Section::Parties, 14.0, 99.0, Cell::Field(CanonicalField::Notify)),
    // boxes 7, 8, 10, 11, 12-13
    entry(
        "lugar_pais_fecha_transportador",
        Section::Cargo,
        108.0,
        81.0,
        Cell::Field(CanonicalField::CarrierTakeover),
    ),
    entry(
        "lugar_pais_plazo_entrega",
        Section::Cargo,
        108.0,
        95.0,
        Cell::Field(CanonicalField::DeliveryTerms),
    ),
    entry(
        "transporte_sucesivos",
        Section::Cargo,
        108.0,
        108.0,
        Cell::Field(CanonicalField::SuccessiveCarriers),
    ),
    entry(
        "detalles_mercaderia",
        Section::Cargo,
        14.0,
        122.0,
        Cell::Field(CanonicalField::CargoDescription),
    ),
    entry(
        "pesos_volumen",
        Section::Cargo,
        147.0,
        121.0,
        Cell::Composite(&[
            T("PB: "),
            F(CanonicalField::GrossWeight),
            T(" PN: "),
            F(CanonicalField::NetWeight),
            T(" V: "),
            F(CanonicalField::Volume),
        ]),
    ),
    // boxes 14, 16, 19-20
    entry(
        "valor_moneda_incoterm",
        Section::Value,
        147.0,
        139.0,
        Cell::Composite(&[
            T("Valor: "),
            F(CanonicalField::IncotermValue),
            T(" "),
            F(CanonicalField::Currency),
            T(" "),
            F(CanonicalField::Incoterm),
        ]),
    ),
    entry(
        "declaracion_valor_mercaderia",
        Section::Value,
        108.0,
        163.0,
        Cell::Field(CanonicalField::DeclaredValue),
    ),
    entry(
        "flete_reembolso",
        Section::Value,
        14.0,
        196.0,
        Cell::Composite(&[
            T("Flete ext: "),
            F(CanonicalField::ExternalFreight),
            T(" | Reemb: "),
            F(CanonicalField::RefundValue),
        ]),
    ),
    // boxes 17, 18, 22
    entry(
        "factura_despacho",
        Section::Customs,
        108.0,
        170.0,
        Cell::Composite(&[
            T("Factura: "),
            F(CanonicalField::ExportInvoice),
            T(" | Despacho: "),
            F(CanonicalField::DispatchNumber),
        ]),
    ),
    entry(
        "instrucciones_aduana",
        Section::Customs,
        108.0,
        195.0,
        Cell::Field(CanonicalField::CustomsInstructions),
    ),
    entry(
        "observaciones",
        Section::Customs,
        108.0,
        213.0,
        Cell::Composite(&[T("Obs: "), F(CanonicalField::Observations)]),
    ),
    // boxes 21, 23, 24
    entry(
        "firma_remitente",
        Section::Signatures,
        14.0,
        222.0,
        Cell::Composite(&[
            T("Firma R: "),
            F(CanonicalField::ConsignorSigner),
            T(" "),
            F(CanonicalField::ConsignorSignedOn),
        ]),
    ),
    entry(
        "firma_transportador",
        Section::Signatures,
        14.0,
        250.0,
        Cell::Composite(&[
            T("Firma T: "),
            F(CanonicalField::CarrierSigner),
            T(" "),
            F(CanonicalField::CarrierSignedOn),
        ]),
    ),
    entry(
        "firma_destinatario",
        Section::Signatures,
        108.0,
        250.0,
        Cell::Composite(&[
            T("Firma D: "),
            F(CanonicalField::RecipientSigner),
            T(" "),
            F(CanonicalField::RecipientSignedOn),
        ]),
    ),
];

/// A validated layout, entries held in render order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    entries: Vec<LayoutEntry>,
}

impl LayoutTable {
    /// The standard CRT form.
    pub fn standard() -> Result<Self, LayoutError> {
        Self::from_entries(STANDARD.to_vec())
    }

    /// Validate and order a set of entries.
    ///
    /// Every printed canonical field must appear in some cell, keys must be
    /// unique, and anchors must lie on the sheet.
    pub fn from_entries(mut entries: Vec<LayoutEntry>) -> Result<Self, LayoutError> {
        let mut keys = HashSet::new();
        for e in &entries {
            if !keys.insert(e.key) {
                return Err(LayoutError::DuplicateKey(e.key));
            }
            if !e.anchor.is_on_sheet() {
                return Err(LayoutError::OffSheet {
                    key: e.key,
                    x_mm: e.anchor.x_mm,
                    y_mm: e.anchor.y_mm,
                });
            }
        }

        let covered: BTreeSet<CanonicalField> =
            entries.iter().flat_map(|e| e.cell.fields()).collect();
        let missing: Vec<&'static str> = CanonicalField::printed()
            .filter(|f| !covered.contains(f))
            .map(CanonicalField::key)
            .collect();
        if !missing.is_empty() {
            return Err(LayoutError::MissingFields(missing));
        }

        // Stable: keeps declaration order inside a section.
        entries.sort_by_key(|e| e.section);
        Ok(Self { entries })
    }

    /// Entries in render order (section order, then declaration order).
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}
