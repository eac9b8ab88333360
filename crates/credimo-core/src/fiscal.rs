//! Boundary coercions: fiscal-number normalization and the
//! age-under-35 derivation.

use chrono::{Months, NaiveDate};

use crate::error::{CredimoError, CredimoResult};

/// Normalize a Portuguese fiscal number (NIF).
///
/// Strips spaces, dots and hyphens; the result must be exactly nine
/// decimal digits. Idempotent: normalizing an already-normalized
/// value returns it unchanged.
pub fn normalize_nif(raw: &str) -> CredimoResult<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-'))
        .collect();

    if digits.len() != 9 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CredimoError::validation(format!(
            "personal_data.nif: NIF inválido, são exigidos 9 dígitos ({raw})"
        )));
    }
    Ok(digits)
}

/// Whether a person born on `birth_date` is under 35 on `today`.
///
/// The boundary is exclusive: on the 35th birthday itself the person
/// is no longer under 35.
pub fn age_under_35(birth_date: NaiveDate, today: NaiveDate) -> bool {
    match birth_date.checked_add_months(Months::new(35 * 12)) {
        Some(thirty_fifth_birthday) => today < thirty_fifth_birthday,
        None => false,
    }
}
