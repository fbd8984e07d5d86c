pub mod calculator;
pub mod classify;
pub mod config;
pub mod expense;
pub mod gross;
pub mod rates;
pub mod stats;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use calculator::{TaxCalculationResult, TaxCalculator};
pub use classify::{RetentionClassifier, DEFAULT_RETENTION_TYPE};
pub use config::{ClassificationEntry, ConfigError, ConfigFile, EngineConfig, BUILTIN_CONFIG};
pub use expense::{
    read_breakdowns_csv, read_csv, read_json, write_breakdowns_csv, BreakdownRecord, CsvField,
    ExpenseError, ExpenseFile, ExpenseInput, ExpenseRecord, LenientDecimal, StoredBreakdown,
};
pub use gross::{resolve_gross_value, MILEAGE_CATEGORY};
pub use rates::{RateTable, ReteFuenteRates, RetentionType};
pub use stats::{aggregate, aggregate_by, AggregateTaxStats, ExpenseTaxFields};
pub use warnings::ExpenseWarning;
