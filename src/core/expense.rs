use super::calculator::TaxCalculationResult;
use super::config::EngineConfig;
use super::gross::{exceeds_gross_limit, is_mileage};
use super::rates::RetentionType;
use super::warnings::ExpenseWarning;
use chrono::NaiveDate;
use cotax_derive::CsvSchema;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Column description generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// A decimal-like input that may not parse.
///
/// Accepts numbers and numeric strings; anything else is kept as `Invalid`
/// so it can be reported and then counted as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LenientDecimal {
    Value(Decimal),
    Invalid(String),
}

impl LenientDecimal {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(LenientDecimal::Value)
            .unwrap_or_else(|_| LenientDecimal::Invalid(raw.to_string()))
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            LenientDecimal::Value(value) => Some(*value),
            LenientDecimal::Invalid(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for LenientDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientDecimalVisitor)
    }
}

struct LenientDecimalVisitor;

const JSON_NUMBER_TOKEN: &str = "$serde_json::private::Number";

impl<'de> Visitor<'de> for LenientDecimalVisitor {
    type Value = LenientDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(LenientDecimal::Value(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(LenientDecimal::Value(Decimal::from(v)))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(Decimal::try_from(v)
            .map(LenientDecimal::Value)
            .unwrap_or_else(|_| LenientDecimal::Invalid(v.to_string())))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(Decimal::try_from(v)
            .map(LenientDecimal::Value)
            .unwrap_or_else(|_| LenientDecimal::Invalid(v.to_string())))
    }

    // Only reached from self-describing formats that already decoded a float
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(LenientDecimal::parse(&v.to_string()))
    }

    // serde_json with `arbitrary_precision` hands non-integer numbers over as
    // a single-entry map holding the literal text
    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        match map.next_key::<String>()? {
            Some(key) if key == JSON_NUMBER_TOKEN => {
                let literal: String = map.next_value()?;
                Ok(LenientDecimal::parse(&literal))
            }
            _ => Err(de::Error::invalid_type(de::Unexpected::Map, &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(LenientDecimal::parse(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(LenientDecimal::Invalid(v.to_string()))
    }
}

// Schema stand-in for `LenientDecimal`
#[allow(dead_code)]
#[derive(JsonSchema)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Expense record as exported by the back office (CSV row or JSON object)
#[derive(Debug, Clone, Deserialize, JsonSchema, CsvSchema)]
pub struct ExpenseRecord {
    /// Identifier in the source system
    #[serde(default)]
    pub id: Option<String>,
    /// Expense date (YYYY-MM-DD)
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Supplier name
    #[serde(default)]
    pub supplier: Option<String>,
    /// Free text description
    #[serde(default)]
    pub description: Option<String>,
    /// Business category; "mileage" values the expense by distance
    pub category: String,
    /// Subcategory identifier used for Rete-Fuente classification
    pub subcategory: String,
    /// Gross amount before IVA
    #[serde(default)]
    #[schemars(with = "Option<NumberOrString>")]
    pub amount: Option<LenientDecimal>,
    /// Distance travelled (mileage category only)
    #[serde(default)]
    #[schemars(with = "Option<NumberOrString>")]
    pub miles: Option<LenientDecimal>,
    /// Whether the provider is registered for IVA (defaults to true)
    #[serde(default)]
    pub provider_vat_registered: Option<bool>,
}

/// CSV row with `amount` and `miles` kept as cell text.
///
/// The csv deserializer infers `f64` for decimal-looking cells, so the
/// numeric columns are parsed here instead.
#[derive(Debug, Deserialize)]
struct ExpenseCsvRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default)]
    description: Option<String>,
    category: String,
    subcategory: String,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    miles: Option<String>,
    #[serde(default)]
    provider_vat_registered: Option<bool>,
}

impl From<ExpenseCsvRow> for ExpenseRecord {
    fn from(row: ExpenseCsvRow) -> Self {
        ExpenseRecord {
            id: row.id,
            date: row.date,
            supplier: row.supplier,
            description: row.description,
            category: row.category,
            subcategory: row.subcategory,
            amount: row.amount.as_deref().map(LenientDecimal::parse),
            miles: row.miles.as_deref().map(LenientDecimal::parse),
            provider_vat_registered: row.provider_vat_registered,
        }
    }
}

/// JSON input root
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExpenseFile {
    pub expenses: Vec<ExpenseRecord>,
}

/// Expense with every input resolved to the value the engine uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseInput {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: String,
    pub amount: Option<Decimal>,
    pub miles: Option<Decimal>,
    pub provider_vat_registered: bool,
}

impl ExpenseRecord {
    /// Data quality findings for this record under the given configuration
    pub fn warnings(&self, config: &EngineConfig) -> Vec<ExpenseWarning> {
        let mut warnings = Vec::new();

        let (field, input) = if is_mileage(&self.category) {
            ("miles", &self.miles)
        } else {
            ("amount", &self.amount)
        };
        match input {
            None => warnings.push(ExpenseWarning::MissingAmount {
                field: field.to_string(),
            }),
            Some(LenientDecimal::Invalid(raw)) => {
                warnings.push(ExpenseWarning::UnparseableAmount {
                    field: field.to_string(),
                    raw: raw.clone(),
                })
            }
            Some(LenientDecimal::Value(value)) if value.is_sign_negative() && !value.is_zero() => {
                warnings.push(ExpenseWarning::NegativeValueClamped { value: *value })
            }
            Some(LenientDecimal::Value(value))
                if exceeds_gross_limit(&self.category, *value, config.rates()) =>
            {
                warnings.push(ExpenseWarning::GrossValueCapped {
                    field: field.to_string(),
                    value: *value,
                })
            }
            Some(LenientDecimal::Value(_)) => {}
        }

        if config.classifier().lookup(&self.subcategory).is_none() {
            warnings.push(ExpenseWarning::UnmappedSubcategory {
                subcategory: self.subcategory.clone(),
            });
        }
        warnings
    }
}

impl From<ExpenseRecord> for ExpenseInput {
    fn from(record: ExpenseRecord) -> Self {
        let id = record.id;
        let resolve = |field: &str, input: Option<LenientDecimal>| match input {
            Some(LenientDecimal::Value(value)) => Some(value),
            Some(LenientDecimal::Invalid(raw)) => {
                log::warn!(
                    "Expense {}: unparseable {} {:?}, using 0",
                    id.as_deref().unwrap_or("-"),
                    field,
                    raw
                );
                None
            }
            None => None,
        };
        let amount = resolve("amount", record.amount);
        let miles = resolve("miles", record.miles);

        ExpenseInput {
            id,
            date: record.date,
            supplier: record.supplier,
            description: record.description,
            category: record.category,
            subcategory: record.subcategory,
            amount,
            miles,
            provider_vat_registered: record.provider_vat_registered.unwrap_or(true),
        }
    }
}

/// Read expense records from CSV
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>, ExpenseError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = rdr
        .deserialize::<ExpenseCsvRow>()
        .map(|row| row.map(ExpenseRecord::from))
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by_key(|r| r.date);
    log::info!("Read {} expense records", records.len());
    Ok(records)
}

/// Read expense records from JSON (`{"expenses": [...]}`)
pub fn read_json<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>, ExpenseError> {
    let input: ExpenseFile = serde_json::from_reader(reader)?;
    let mut records = input.expenses;
    records.sort_by_key(|r| r.date);
    log::info!("Read {} expense records", records.len());
    Ok(records)
}

/// A computed breakdown as written to CSV, one row per expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownRecord {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub subcategory: String,
    pub retention_type: RetentionType,
    pub provider_vat_registered: bool,
    pub gross_value: Decimal,
    pub vat: Decimal,
    pub total_with_vat: Decimal,
    pub rete_fuente: Decimal,
    pub rete_iva: Decimal,
    pub rete_ica: Decimal,
    pub total_withholdings: Decimal,
    pub net_payable: Decimal,
}

impl BreakdownRecord {
    pub fn new(expense: &ExpenseInput, result: &TaxCalculationResult) -> Self {
        BreakdownRecord {
            id: expense.id.clone(),
            date: expense.date,
            category: expense.category.clone(),
            subcategory: expense.subcategory.clone(),
            retention_type: result.retention_type,
            provider_vat_registered: expense.provider_vat_registered,
            gross_value: result.gross_value,
            vat: result.vat,
            total_with_vat: result.total_with_vat,
            rete_fuente: result.rete_fuente,
            rete_iva: result.rete_iva,
            rete_ica: result.rete_ica,
            total_withholdings: result.total_withholdings,
            net_payable: result.net_payable,
        }
    }
}

pub fn write_breakdowns_csv<W: Write>(
    rows: &[BreakdownRecord],
    writer: W,
) -> Result<(), ExpenseError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// A previously computed breakdown read back from storage.
///
/// Legacy rows may lack any of the numeric columns, and cells that are not
/// numbers count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoredBreakdown {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub retention_type: Option<RetentionType>,
    #[serde(default, deserialize_with = "lenient_cell")]
    pub gross_value: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_cell")]
    pub vat: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_cell")]
    pub rete_fuente: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_cell")]
    pub rete_iva: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_cell")]
    pub rete_ica: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_cell")]
    pub net_payable: Option<Decimal>,
}

impl From<BreakdownRecord> for StoredBreakdown {
    fn from(record: BreakdownRecord) -> Self {
        StoredBreakdown {
            id: record.id,
            date: record.date,
            category: Some(record.category),
            retention_type: Some(record.retention_type),
            gross_value: Some(record.gross_value),
            vat: Some(record.vat),
            rete_fuente: Some(record.rete_fuente),
            rete_iva: Some(record.rete_iva),
            rete_ica: Some(record.rete_ica),
            net_payable: Some(record.net_payable),
        }
    }
}

fn lenient_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    let cell: Option<String> = Option::deserialize(deserializer)?;
    Ok(match cell.as_deref().map(LenientDecimal::parse) {
        Some(LenientDecimal::Value(value)) => Some(value),
        Some(LenientDecimal::Invalid(raw)) => {
            log::warn!("Stored breakdown value {:?} is not a number, using 0", raw);
            None
        }
        None => None,
    })
}

pub fn read_breakdowns_csv<R: Read>(reader: R) -> Result<Vec<StoredBreakdown>, ExpenseError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let rows = rdr
        .deserialize::<StoredBreakdown>()
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Read {} stored breakdowns", rows.len());
    Ok(rows)
}
