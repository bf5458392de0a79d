//! Sequential waybill numbering (`PY` + 9 digits).

use cartaporte_core::{DomainError, WaybillNumber};

pub const WAYBILL_PREFIX: &str = "PY";
pub const WAYBILL_DIGITS: usize = 9;

/// Parse a seed code such as `PY000000001` into its sequence number.
pub fn parse_seed(code: &str) -> Result<u64, DomainError> {
    let digits = code
        .strip_prefix(WAYBILL_PREFIX)
        .filter(|rest| rest.len() == WAYBILL_DIGITS && rest.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| {
            DomainError::validation(format!(
                "código inválido: expected {WAYBILL_PREFIX} followed by {WAYBILL_DIGITS} digits"
            ))
        })?;
    digits
        .parse()
        .map_err(|_| DomainError::validation("código inválido"))
}

/// Next number for a carrier.
///
/// `latest` is the carrier's highest existing number with the same prefix
/// and length. When it is absent or unparseable the seed itself is issued.
pub fn next_waybill_number(seed: &str, latest: Option<&str>) -> Result<WaybillNumber, DomainError> {
    let seed = parse_seed(seed)?;
    let next = match latest.map(parse_seed) {
        Some(Ok(n)) => n + 1,
        _ => seed,
    };
    let formatted = format!("{WAYBILL_PREFIX}{next:0width$}", width = WAYBILL_DIGITS);
    if formatted.len() != WAYBILL_PREFIX.len() + WAYBILL_DIGITS {
        return Err(DomainError::validation("waybill sequence exhausted"));
    }
    WaybillNumber::new(formatted)
}
