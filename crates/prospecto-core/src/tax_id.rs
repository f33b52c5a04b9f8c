//! CNPJ helpers.
//!
//! A CNPJ has 14 digits: an 8-digit company root, a 4-digit establishment
//! sequence, and 2 check digits. Sequence `0001` is the headquarters.

const HEADQUARTERS_SEQUENCE: &str = "0001";

/// Strips everything that is not an ASCII digit.
#[must_use]
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// `true` when `raw` is a full CNPJ whose establishment sequence is `0001`.
#[must_use]
pub fn is_headquarters_tax_id(raw: &str) -> bool {
    let digits = normalize_tax_id(raw);
    digits.len() == 14 && &digits[8..12] == HEADQUARTERS_SEQUENCE
}

/// `true` when both values normalize to the same non-empty digit string.
#[must_use]
pub fn same_tax_id(a: &str, b: &str) -> bool {
    let a = normalize_tax_id(a);
    !a.is_empty() && a == normalize_tax_id(b)
}
