//! Canonical CRT document model.
//!
//! This crate owns the single schema-stable shape served to consumers and
//! printed on the form, plus the pure resolution step that turns a raw
//! left-joined row into that shape (no IO, no HTTP, no storage).

pub mod document;
pub mod field;
pub mod numbering;
pub mod party;
pub mod projection;
pub mod raw;

pub use document::{ChargeLine, CrtDocument, Parties, Signature, Signatures};
pub use field::CanonicalField;
pub use numbering::{WAYBILL_DIGITS, WAYBILL_PREFIX, next_waybill_number, parse_seed};
pub use party::{Party, PartyAttribute, PartyRole};
pub use raw::{RawCrtRow, resolve};
