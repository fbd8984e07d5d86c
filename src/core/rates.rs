use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rete-Fuente retention type. Each type carries exactly one withholding rate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RetentionType {
    Purchases,
    Services,
    Leasing,
    AdvertisingTransport,
    ProfessionalFees,
}

impl RetentionType {
    pub const ALL: [RetentionType; 5] = [
        RetentionType::Purchases,
        RetentionType::Services,
        RetentionType::Leasing,
        RetentionType::AdvertisingTransport,
        RetentionType::ProfessionalFees,
    ];

    /// Display label as used on expense reports
    pub fn label(&self) -> &'static str {
        match self {
            RetentionType::Purchases => "Compras",
            RetentionType::Services => "Servicios",
            RetentionType::Leasing => "Arrendamientos",
            RetentionType::AdvertisingTransport => "Publicidad y transporte",
            RetentionType::ProfessionalFees => "Honorarios",
        }
    }

    /// Identifier used in configuration files and CSV output
    pub fn key(&self) -> &'static str {
        match self {
            RetentionType::Purchases => "purchases",
            RetentionType::Services => "services",
            RetentionType::Leasing => "leasing",
            RetentionType::AdvertisingTransport => "advertising_transport",
            RetentionType::ProfessionalFees => "professional_fees",
        }
    }
}

impl fmt::Display for RetentionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Rete-Fuente rate for each retention type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReteFuenteRates {
    #[schemars(with = "String")]
    pub purchases: Decimal,
    #[schemars(with = "String")]
    pub services: Decimal,
    #[schemars(with = "String")]
    pub leasing: Decimal,
    #[schemars(with = "String")]
    pub advertising_transport: Decimal,
    #[schemars(with = "String")]
    pub professional_fees: Decimal,
}

impl ReteFuenteRates {
    pub fn rate(&self, retention_type: RetentionType) -> Decimal {
        match retention_type {
            RetentionType::Purchases => self.purchases,
            RetentionType::Services => self.services,
            RetentionType::Leasing => self.leasing,
            RetentionType::AdvertisingTransport => self.advertising_transport,
            RetentionType::ProfessionalFees => self.professional_fees,
        }
    }
}

/// The rates applied to every expense.
///
/// Values are decoded from decimal strings so that `0.19` is exactly `0.19`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RateTable {
    /// IVA rate added on top of the gross value
    #[schemars(with = "String")]
    pub vat_rate: Decimal,
    /// Fraction of the IVA withheld from VAT-registered providers
    #[schemars(with = "String")]
    pub rete_iva_fraction: Decimal,
    /// Municipal industry and commerce withholding rate
    #[schemars(with = "String")]
    pub rete_ica_rate: Decimal,
    /// Currency per mile for mileage expenses
    #[schemars(with = "String")]
    pub mileage_rate: Decimal,
    pub rete_fuente: ReteFuenteRates,
}

impl RateTable {
    pub fn rete_fuente_rate(&self, retention_type: RetentionType) -> Decimal {
        self.rete_fuente.rate(retention_type)
    }
}
