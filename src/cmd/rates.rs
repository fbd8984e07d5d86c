//! Rates command - show the active rate table and subcategory classification

use clap::Args;
use cotax::core::{ClassificationEntry, EngineConfig, RateTable, RetentionType, DEFAULT_RETENTION_TYPE};
use cotax::format::format_rate;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct RatesCommand {
    /// Only list subcategories in this category
    #[arg(short, long)]
    category: Option<String>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RatesOutput<'a> {
    version: &'a str,
    fingerprint: &'a str,
    default_retention_type: RetentionType,
    rates: &'a RateTable,
    classification: Vec<&'a ClassificationEntry>,
}

#[derive(Debug, Clone, Tabled)]
struct RateRow {
    #[tabled(rename = "Concept")]
    concept: String,
    #[tabled(rename = "Rate")]
    rate: String,
}

#[derive(Debug, Clone, Tabled)]
struct ClassificationRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Subcategory")]
    subcategory: String,
    #[tabled(rename = "Retention")]
    retention: &'static str,
    #[tabled(rename = "Rete-Fuente")]
    rate: String,
}

impl RatesCommand {
    pub fn exec(&self, config: &EngineConfig) -> anyhow::Result<()> {
        let entries: Vec<&ClassificationEntry> = config
            .classification()
            .iter()
            .filter(|e| {
                self.category
                    .as_deref()
                    .map_or(true, |c| e.category.eq_ignore_ascii_case(c))
            })
            .collect();

        if self.json {
            let output = RatesOutput {
                version: config.version(),
                fingerprint: config.fingerprint(),
                default_retention_type: DEFAULT_RETENTION_TYPE,
                rates: config.rates(),
                classification: entries,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let rates = config.rates();
        let mut rate_rows = vec![
            RateRow {
                concept: "IVA".to_string(),
                rate: format_rate(rates.vat_rate),
            },
            RateRow {
                concept: "Rete-IVA (share of IVA)".to_string(),
                rate: format_rate(rates.rete_iva_fraction),
            },
            RateRow {
                concept: "Rete-ICA".to_string(),
                rate: format_rate(rates.rete_ica_rate),
            },
        ];
        rate_rows.extend(RetentionType::ALL.into_iter().map(|t| RateRow {
            concept: format!("Rete-Fuente {}", t.label()),
            rate: format_rate(rates.rete_fuente_rate(t)),
        }));
        rate_rows.push(RateRow {
            concept: "Mileage (per mile)".to_string(),
            rate: rates.mileage_rate.to_string(),
        });

        let classification_rows: Vec<ClassificationRow> = entries
            .iter()
            .map(|e| ClassificationRow {
                category: e.category.clone(),
                subcategory: e.subcategory.clone(),
                retention: e.retention_type.label(),
                rate: format_rate(rates.rete_fuente_rate(e.retention_type)),
            })
            .collect();

        println!();
        println!("RATES {}", config.version());
        if let Some(description) = config.description() {
            println!("{}", description);
        }
        println!("sha256 {}", config.fingerprint());
        println!();
        println!("{}", Table::new(&rate_rows).with(Style::rounded()));
        println!();
        println!(
            "CLASSIFICATION (unlisted subcategories: {})",
            DEFAULT_RETENTION_TYPE.label()
        );
        println!("{}", Table::new(&classification_rows).with(Style::rounded()));
        Ok(())
    }
}
