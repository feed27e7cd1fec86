//! Field validation and normalization
//!
//! Pure helpers for identifier cleanup and check-digit validation, plus the
//! per-line parser that turns one raw line into a [`Buyer`] or a tagged
//! [`LineRejection`]. None of this touches shared state, so every rule is
//! unit-testable in isolation and validation is idempotent: the same line
//! always yields the same verdict and the same normalized record.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;
use tracing::debug;

use super::types::{Buyer, LineRejection, SkipReason, NULL_SENTINEL};

/// Date layout used by the upstream export
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Remove the `.`, `-` and `/` punctuation used in formatted CPF/CNPJ values
pub fn strip_punctuation(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '/'))
        .collect()
}

/// Validate a CPF (11-digit person identifier with two check digits).
///
/// Expects punctuation to be stripped already. The `NULL` sentinel is
/// accepted verbatim. Rejects anything that is not exactly 11 ASCII digits,
/// the ten all-repeated-digit sequences, and any value whose check digits do
/// not match the weighted-sum-mod-11 computation.
pub fn validate_cpf(cpf: &str) -> bool {
    if cpf == NULL_SENTINEL {
        return true;
    }
    if cpf.len() != 11 || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = cpf.bytes().map(|b| u32::from(b - b'0')).collect();
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    digits[9] == check_digit(&digits[..9]) && digits[10] == check_digit(&digits[..10])
}

/// Compute one CPF check digit over a digit prefix.
///
/// Weights run from `len + 1` down to 2; a computed digit of 10 or 11 is
/// coerced to 0.
fn check_digit(digits: &[u32]) -> u32 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (first_weight - i as u32))
        .sum();

    let digit = 11 - sum % 11;
    if digit >= 10 {
        0
    } else {
        digit
    }
}

/// Shape check for a store identifier (CNPJ-shaped, 14 digits).
///
/// The `NULL` sentinel is accepted verbatim. No check-digit computation is
/// performed for this field; only length and digit shape are enforced.
pub fn validate_cnpj_shape(cnpj: &str) -> bool {
    if cnpj == NULL_SENTINEL {
        return true;
    }
    cnpj.len() == 14 && cnpj.bytes().all(|b| b.is_ascii_digit())
}

/// Parse and validate one raw input line.
///
/// A line containing a space is split on spaces, which keeps decimal commas
/// inside the monetary tokens (the upstream export writes `495,30`); a line
/// without spaces is split on commas. Empty tokens are dropped either way.
/// Requires at least 8 fields, validates identifiers, and maps
/// `NULL`/unparsable date and monetary fields to absent values. Rejections
/// are per-line and recoverable; the caller logs them and moves on.
pub fn parse_line(line: &str) -> Result<Buyer, LineRejection> {
    let delimiter = if line.contains(' ') { ' ' } else { ',' };
    let fields: Vec<&str> = line.split(delimiter).filter(|t| !t.is_empty()).collect();

    if fields.len() < 8 {
        return Err(LineRejection::new(SkipReason::MalformedLine, line));
    }

    let cpf = strip_punctuation(fields[0]);
    if !validate_cpf(&cpf) {
        return Err(LineRejection::new(SkipReason::InvalidCpf, fields[0]));
    }

    let most_frequent_store = strip_punctuation(fields[6]);
    if !validate_cnpj_shape(&most_frequent_store) {
        return Err(LineRejection::new(SkipReason::InvalidStoreId, fields[6]));
    }
    let last_purchase_store = strip_punctuation(fields[7]);
    if !validate_cnpj_shape(&last_purchase_store) {
        return Err(LineRejection::new(SkipReason::InvalidStoreId, fields[7]));
    }

    Ok(Buyer {
        cpf,
        private: fields[1] == "1",
        incomplete: fields[2] == "1",
        last_purchase: parse_nullable_date(fields[3]),
        avg_ticket: parse_nullable_decimal(fields[4]),
        last_ticket: parse_nullable_decimal(fields[5]),
        most_frequent_store,
        last_purchase_store,
    })
}

/// Parse a monetary field into an optional decimal.
///
/// The `NULL` sentinel maps to absent. A decimal comma (upstream export
/// convention, e.g. `495,30`) is normalized to a period before parsing. A
/// value that still fails to parse is treated as absent, not as a line
/// error.
pub fn parse_nullable_decimal(field: &str) -> Option<BigDecimal> {
    if field == NULL_SENTINEL {
        return None;
    }
    let normalized = field.replace(',', ".");
    match BigDecimal::from_str(&normalized) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(value = %field, error = %e, "Unparsable monetary field treated as absent");
            None
        }
    }
}

/// Parse a date field into an optional date. `NULL` and unparsable values
/// map to absent, consistent with the monetary-field policy.
pub fn parse_nullable_date(field: &str) -> Option<NaiveDate> {
    if field == NULL_SENTINEL {
        return None;
    }
    match NaiveDate::parse_from_str(field, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(value = %field, error = %e, "Unparsable date field treated as absent");
            None
        }
    }
}
