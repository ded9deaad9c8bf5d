//! BRL money formatting.
//!
//! All amounts in the system are `rust_decimal::Decimal` in reais. This
//! module only handles display formatting for emails and logs.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal amount as Brazilian reais, e.g. `R$ 159,90`.
///
/// Always renders two decimal places with a comma separator, rounding
/// half-away-from-zero as a shopper would expect. Negative amounts keep
/// their sign (`R$ -10,00`); they do not occur in checkout but can show up
/// in reconciliation logs.
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("R$ {}", format!("{rounded:.2}").replace('.', ","))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_format_whole_amount() {
        assert_eq!(format_brl(Decimal::new(25, 0)), "R$ 25,00");
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_brl(Decimal::new(15990, 2)), "R$ 159,90");
    }

    #[test]
    fn test_format_rounds_to_two_places() {
        assert_eq!(format_brl(Decimal::new(10005, 3)), "R$ 10,01");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_brl(Decimal::new(-1000, 2)), "R$ -10,00");
    }
}
