//! Customer phone numbers, normalized to international format.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Country calling code prefixed to national numbers.
const COUNTRY_PREFIX: &str = "+237";

/// A mobile-money phone number in `+237XXXXXXXXX` form.
///
/// All customer input goes through [`PhoneNumber::normalize`] before storage
/// or transmission to the provider, so the rest of the system only ever sees
/// the international format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes raw customer input to international format.
    ///
    /// Accepted inputs:
    /// - `+237XXXXXXXXX` - already normalized, kept as-is
    /// - `237XXXXXXXXX` - missing the plus sign
    /// - `0XXXXXXXXX` - national format with trunk zero
    /// - `XXXXXXXXX` - bare nine-digit national number
    pub fn normalize(raw: &str) -> Result<Self, DomainError> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
            .collect();

        let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::InvalidPhone(raw.to_string()));
        }

        let national = if let Some(rest) = digits.strip_prefix("237") {
            rest
        } else if let Some(rest) = digits.strip_prefix('0') {
            rest
        } else {
            digits
        };

        if national.len() != 9 {
            return Err(DomainError::InvalidPhone(raw.to_string()));
        }

        Ok(Self(format!("{}{}", COUNTRY_PREFIX, national)))
    }

    /// Returns the normalized number.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the normalized string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Wraps a value already known to be normalized (e.g. read back from the
    /// database).
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
