//! Display formatting for Colombian pesos (es-CO conventions).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use separator::Separatable;

/// Format an amount as pesos with no decimals and `.` thousands separators: `$ 1.190.000`
pub fn format_cop(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = match rounded.abs().to_i64() {
        Some(units) => units.separated_string().replace(',', "."),
        None => rounded.abs().normalize().to_string(),
    };
    format!("{}$ {}", sign, digits)
}

/// Format a rate as a percentage with a decimal comma: `0.005` -> `0,5%`
pub fn format_rate(rate: Decimal) -> String {
    let percent = (rate * Decimal::ONE_HUNDRED).normalize();
    format!("{}%", percent.to_string().replace('.', ","))
}
