//! CEP (Brazilian postal code) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cep`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CepError {
    /// The input string is empty.
    #[error("CEP cannot be empty")]
    Empty,
    /// The input does not contain exactly 8 digits.
    #[error("CEP must contain exactly 8 digits (got {got})")]
    WrongLength {
        /// Number of digits found.
        got: usize,
    },
}

/// A CEP, stored as its 8 digits.
///
/// Accepts both `01310-100` and `01310100`; the hyphen is stripped on parse.
/// Whether the CEP actually exists is answered by the postal-code lookup
/// service, not here.
///
/// ## Examples
///
/// ```
/// use luar_core::Cep;
///
/// let cep = Cep::parse("01310-100").unwrap();
/// assert_eq!(cep.as_str(), "01310100");
/// assert_eq!(cep.hyphenated(), "01310-100");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cep(String);

impl Cep {
    /// Parse a `Cep` from a string, stripping any non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not contain exactly
    /// 8 digits.
    pub fn parse(s: &str) -> Result<Self, CepError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(CepError::Empty);
        }

        if digits.len() != 8 {
            return Err(CepError::WrongLength { got: digits.len() });
        }

        Ok(Self(digits))
    }

    /// Returns the bare 8 digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the CEP in its conventional `00000-000` form.
    #[must_use]
    // parse() guarantees exactly 8 ASCII digits, so the ranges are in bounds.
    #[allow(clippy::indexing_slicing)]
    pub fn hyphenated(&self) -> String {
        format!("{}-{}", &self.0[0..5], &self.0[5..8])
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Cep {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_hyphen() {
        let cep = Cep::parse("88010-400").unwrap();
        assert_eq!(cep.as_str(), "88010400");
    }

    #[test]
    fn test_parse_bare_digits() {
        assert!(Cep::parse("01310100").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Cep::parse(""), Err(CepError::Empty)));
        assert!(matches!(Cep::parse("-"), Err(CepError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Cep::parse("1310-100"),
            Err(CepError::WrongLength { got: 7 })
        ));
    }

    #[test]
    fn test_hyphenated() {
        let cep = Cep::parse("01310100").unwrap();
        assert_eq!(cep.hyphenated(), "01310-100");
    }
}
