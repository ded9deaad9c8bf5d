//! CPF (Brazilian individual taxpayer id) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Cpf`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CpfError {
    /// The input string is empty.
    #[error("CPF cannot be empty")]
    Empty,
    /// The input does not contain exactly 11 digits.
    #[error("CPF must contain exactly 11 digits (got {got})")]
    WrongLength {
        /// Number of digits found.
        got: usize,
    },
}

/// A CPF, stored as its 11 digits.
///
/// Punctuation (`123.456.789-09`) is stripped on parse; only the digit count
/// is checked. The payment provider performs the authoritative check-digit
/// validation, so none is duplicated here.
///
/// ## Examples
///
/// ```
/// use luar_core::Cpf;
///
/// let cpf = Cpf::parse("123.456.789-09").unwrap();
/// assert_eq!(cpf.as_str(), "12345678909");
/// assert_eq!(cpf.formatted(), "123.456.789-09");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Parse a `Cpf` from a string, stripping any non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not contain exactly
    /// 11 digits.
    pub fn parse(s: &str) -> Result<Self, CpfError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(CpfError::Empty);
        }

        if digits.len() != 11 {
            return Err(CpfError::WrongLength { got: digits.len() });
        }

        Ok(Self(digits))
    }

    /// Returns the bare 11 digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the CPF in its conventional `000.000.000-00` form.
    #[must_use]
    // parse() guarantees exactly 11 ASCII digits, so the ranges are in bounds.
    #[allow(clippy::indexing_slicing)]
    pub fn formatted(&self) -> String {
        format!(
            "{}.{}.{}-{}",
            &self.0[0..3],
            &self.0[3..6],
            &self.0[6..9],
            &self.0[9..11]
        )
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
