//! Calculate command - tax breakdown of a single expense

use clap::Args;
use cotax::core::{
    EngineConfig, ExpenseInput, ExpenseRecord, LenientDecimal, TaxCalculationResult, TaxCalculator,
    MILEAGE_CATEGORY,
};
use cotax::format::{format_cop, format_rate};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct CalculateCommand {
    /// Gross amount before IVA
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "miles")]
    amount: Option<Decimal>,

    /// Distance travelled; the expense is valued at the mileage rate
    #[arg(short, long, allow_negative_numbers = true)]
    miles: Option<Decimal>,

    /// Expense category (defaults to "mileage" when --miles is given)
    #[arg(short, long)]
    category: Option<String>,

    /// Subcategory identifier, e.g. office_rent
    #[arg(short, long)]
    subcategory: String,

    /// Provider is not registered for IVA, so no Rete-IVA is withheld
    #[arg(long)]
    not_vat_registered: bool,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CalculationOutput<'a> {
    config_version: &'a str,
    category: &'a str,
    subcategory: &'a str,
    provider_vat_registered: bool,
    #[serde(flatten)]
    result: &'a TaxCalculationResult,
}

#[derive(Debug, Clone, Tabled)]
struct LineRow {
    #[tabled(rename = "Concept")]
    concept: &'static str,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl LineRow {
    fn new(concept: &'static str, rate: Option<Decimal>, value: Decimal) -> Self {
        LineRow {
            concept,
            rate: rate.map(format_rate).unwrap_or_default(),
            value: format_cop(value),
        }
    }
}

impl CalculateCommand {
    pub fn exec(&self, config: &EngineConfig) -> anyhow::Result<()> {
        if self.amount.is_none() && self.miles.is_none() {
            anyhow::bail!("Provide either --amount or --miles");
        }

        let category = match (&self.category, self.miles) {
            (Some(category), _) => category.clone(),
            (None, Some(_)) => MILEAGE_CATEGORY.to_string(),
            (None, None) => "general".to_string(),
        };
        let record = ExpenseRecord {
            id: None,
            date: None,
            supplier: None,
            description: None,
            category,
            subcategory: self.subcategory.clone(),
            amount: self.amount.map(LenientDecimal::Value),
            miles: self.miles.map(LenientDecimal::Value),
            provider_vat_registered: Some(!self.not_vat_registered),
        };
        for warning in record.warnings(config) {
            log::warn!("{}", warning);
        }
        let expense = ExpenseInput::from(record);

        let result = TaxCalculator::new(config).calculate_expense(&expense);

        if self.json {
            let output = CalculationOutput {
                config_version: config.version(),
                category: &expense.category,
                subcategory: &expense.subcategory,
                provider_vat_registered: expense.provider_vat_registered,
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_breakdown(config, &expense, &result);
        }
        Ok(())
    }

    fn print_breakdown(
        &self,
        config: &EngineConfig,
        expense: &ExpenseInput,
        result: &TaxCalculationResult,
    ) {
        let rates = config.rates();
        let rete_iva_rate = expense
            .provider_vat_registered
            .then_some(rates.rete_iva_fraction);

        let lines = vec![
            LineRow::new("Gross value", None, result.gross_value),
            LineRow::new("IVA", Some(rates.vat_rate), result.vat),
            LineRow::new("Total with IVA", None, result.total_with_vat),
            LineRow::new("Rete-Fuente", Some(result.rete_fuente_rate), result.rete_fuente),
            LineRow::new("Rete-IVA", rete_iva_rate, result.rete_iva),
            LineRow::new("Rete-ICA", Some(rates.rete_ica_rate), result.rete_ica),
            LineRow::new("Total withholdings", None, result.total_withholdings),
            LineRow::new("Net payable", None, result.net_payable),
        ];
        let benefits = vec![
            LineRow::new("Deductible cost", None, result.deductible_cost),
            LineRow::new("Deductible IVA", None, result.vat_deductible),
            LineRow::new("Income tax credit", None, result.income_tax_credit),
            LineRow::new("ICA credit", None, result.ica_credit),
        ];

        println!();
        println!("EXPENSE BREAKDOWN ({})", config.version());
        println!(
            "  {} / {} -> {}",
            expense.category, expense.subcategory, result.retention_type
        );
        if !expense.provider_vat_registered {
            println!("  Provider not registered for IVA");
        }
        println!();
        println!("{}", table(&lines));
        println!();
        println!("TAX BENEFITS");
        println!("{}", table(&benefits));
    }
}

fn table(rows: &[LineRow]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}
