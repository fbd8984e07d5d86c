use super::rates::RateTable;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Category whose gross value is derived from distance travelled
pub const MILEAGE_CATEGORY: &str = "mileage";

/// Largest gross value the engine computes with. Larger inputs are capped so
/// every later step stays within `Decimal` range.
pub const MAX_GROSS_VALUE: Decimal = dec!(100000000000000000000);

/// Taxable gross value of a single expense.
///
/// Mileage expenses are valued at `miles × mileage_rate`; every other category
/// uses `amount`. Missing inputs count as zero and the result always lies in
/// `0..=MAX_GROSS_VALUE`.
pub fn resolve_gross_value(
    category: &str,
    amount: Option<Decimal>,
    miles: Option<Decimal>,
    rates: &RateTable,
) -> Decimal {
    let value = if is_mileage(category) {
        mileage_value(miles.unwrap_or(Decimal::ZERO), rates)
    } else {
        amount.unwrap_or(Decimal::ZERO)
    };
    bound_gross_value(value)
}

/// Whether an amount (or miles, for mileage) resolves above `MAX_GROSS_VALUE`
pub fn exceeds_gross_limit(category: &str, value: Decimal, rates: &RateTable) -> bool {
    let gross = if is_mileage(category) {
        value.checked_mul(rates.mileage_rate)
    } else {
        Some(value)
    };
    gross.map_or(true, |gross| gross > MAX_GROSS_VALUE)
}

pub fn is_mileage(category: &str) -> bool {
    category == MILEAGE_CATEGORY
}

pub fn bound_gross_value(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, MAX_GROSS_VALUE)
}

fn mileage_value(miles: Decimal, rates: &RateTable) -> Decimal {
    miles.checked_mul(rates.mileage_rate).unwrap_or(if miles.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
