use super::gross::MAX_GROSS_VALUE;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data quality findings on expense records.
///
/// Warnings never change the computed breakdown; they surface the defaults the
/// engine silently applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum ExpenseWarning {
    /// Subcategory is not in the classification table and was treated as Services.
    UnmappedSubcategory { subcategory: String },
    /// Raw value was negative and the gross value was clamped to zero.
    NegativeValueClamped {
        #[schemars(with = "String")]
        value: Decimal,
    },
    /// Resolved gross value was above the supported limit and was capped.
    GrossValueCapped {
        field: String,
        #[schemars(with = "String")]
        value: Decimal,
    },
    /// Amount or miles could not be parsed and counted as zero.
    UnparseableAmount { field: String, raw: String },
    /// The field the gross value depends on is absent and counted as zero.
    MissingAmount { field: String },
}

impl ExpenseWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            ExpenseWarning::UnmappedSubcategory { .. } => "UnmappedSubcategory",
            ExpenseWarning::NegativeValueClamped { .. } => "NegativeValueClamped",
            ExpenseWarning::GrossValueCapped { .. } => "GrossValueCapped",
            ExpenseWarning::UnparseableAmount { .. } => "UnparseableAmount",
            ExpenseWarning::MissingAmount { .. } => "MissingAmount",
        }
    }
}

impl fmt::Display for ExpenseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseWarning::UnmappedSubcategory { subcategory } => write!(
                f,
                "Subcategory {:?} has no retention type, Services rate applied",
                subcategory
            ),
            ExpenseWarning::NegativeValueClamped { value } => {
                write!(f, "Negative value {} treated as 0", value)
            }
            ExpenseWarning::GrossValueCapped { field, value } => write!(
                f,
                "{} {} is above the supported limit, gross value capped at {}",
                field, value, MAX_GROSS_VALUE
            ),
            ExpenseWarning::UnparseableAmount { field, raw } => {
                write!(f, "Could not parse {} {:?}, treated as 0", field, raw)
            }
            ExpenseWarning::MissingAmount { field } => {
                write!(f, "No {} given, treated as 0", field)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn serializes_with_type_tag() {
        let w = ExpenseWarning::UnparseableAmount {
            field: "amount".to_string(),
            raw: "12,5k".to_string(),
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "UnparseableAmount");
        assert_eq!(json["raw"], "12,5k");
    }

    #[test]
    fn messages() {
        let w = ExpenseWarning::NegativeValueClamped { value: dec!(-100) };
        assert_eq!(w.to_string(), "Negative value -100 treated as 0");
        assert_eq!(w.kind(), "NegativeValueClamped");

        let w = ExpenseWarning::GrossValueCapped {
            field: "amount".to_string(),
            value: dec!(200000000000000000000),
        };
        assert_eq!(
            w.to_string(),
            "amount 200000000000000000000 is above the supported limit, gross value capped at 100000000000000000000"
        );
    }
}
