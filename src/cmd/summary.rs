//! Summary command - aggregated totals for reporting

use crate::cmd::{read_expenses, read_stored_breakdowns, RecordFilter};
use clap::{Args, ValueEnum};
use cotax::core::{
    aggregate, aggregate_by, AggregateTaxStats, BreakdownRecord, EngineConfig, ExpenseInput,
    StoredBreakdown, TaxCalculator,
};
use cotax::format::format_cop;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// CSV or JSON file containing expenses ("-" for stdin)
    #[arg(short, long)]
    expenses: PathBuf,

    /// Input holds computed breakdown rows (as written by `expenses --csv`)
    #[arg(long)]
    computed: bool,

    /// Only expenses dated in this year
    #[arg(short, long)]
    year: Option<i32>,

    /// Only expenses in this category
    #[arg(short, long)]
    category: Option<String>,

    /// Also break the totals down by group
    #[arg(short, long, value_enum)]
    by: Option<GroupBy>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupBy {
    Category,
    Retention,
}

impl GroupBy {
    fn key(&self, row: &StoredBreakdown) -> String {
        let key = match self {
            GroupBy::Category => row.category.clone(),
            GroupBy::Retention => row.retention_type.map(|t| t.key().to_string()),
        };
        key.unwrap_or_else(|| "unknown".to_string())
    }
}

/// Summary data for JSON output
#[derive(Debug, Serialize)]
struct SummaryData<'a> {
    selection: String,
    config_version: &'a str,
    config_fingerprint: &'a str,
    totals: &'a AggregateTaxStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<&'a BTreeMap<String, AggregateTaxStats>>,
}

#[derive(Debug, Clone, Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Expenses")]
    count: usize,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "IVA")]
    vat: String,
    #[tabled(rename = "Withholdings")]
    withholdings: String,
    #[tabled(rename = "Net Payable")]
    net_payable: String,
}

impl SummaryCommand {
    pub fn exec(&self, config: &EngineConfig) -> anyhow::Result<()> {
        let filter = RecordFilter {
            year: self.year,
            category: self.category.as_deref(),
        };
        let rows: Vec<StoredBreakdown> = self
            .load_rows(config)?
            .into_iter()
            .filter(|row| filter.matches(row.date, row.category.as_deref()))
            .collect();

        let totals = aggregate(&rows);
        let groups = self.by.map(|by| aggregate_by(&rows, |row| by.key(row)));

        if self.json {
            let data = SummaryData {
                selection: filter.describe(),
                config_version: config.version(),
                config_fingerprint: config.fingerprint(),
                totals: &totals,
                groups: groups.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
        } else {
            print_summary(&filter, config, &totals, groups.as_ref());
        }
        Ok(())
    }

    fn load_rows(&self, config: &EngineConfig) -> anyhow::Result<Vec<StoredBreakdown>> {
        if self.computed {
            return read_stored_breakdowns(&self.expenses);
        }
        let calculator = TaxCalculator::new(config);
        let rows = read_expenses(&self.expenses)?
            .into_iter()
            .map(ExpenseInput::from)
            .map(|expense| {
                let result = calculator.calculate_expense(&expense);
                StoredBreakdown::from(BreakdownRecord::new(&expense, &result))
            })
            .collect();
        Ok(rows)
    }
}

fn print_summary(
    filter: &RecordFilter,
    config: &EngineConfig,
    totals: &AggregateTaxStats,
    groups: Option<&BTreeMap<String, AggregateTaxStats>>,
) {
    println!();
    println!(
        "TAX SUMMARY ({}) - rates {}",
        filter.describe(),
        config.version()
    );
    println!();
    println!("EXPENSES");
    println!("  Count:                {}", totals.expense_count);
    println!("  Gross value:          {}", format_cop(totals.total_gross_value));
    println!("  IVA:                  {}", format_cop(totals.total_vat));
    println!();
    println!("WITHHOLDINGS");
    println!("  Rete-Fuente:          {}", format_cop(totals.total_rete_fuente));
    println!("  Rete-IVA:             {}", format_cop(totals.total_rete_iva));
    println!("  Rete-ICA:             {}", format_cop(totals.total_rete_ica));
    println!("  Total:                {}", format_cop(totals.total_withholdings));
    println!();
    println!("NET PAYABLE:            {}", format_cop(totals.total_net_payable));
    println!();
    println!("TAX BENEFITS");
    println!("  Deductible IVA:       {}", format_cop(totals.total_vat_deductible));
    println!("  Income tax credit:    {}", format_cop(totals.total_income_tax_credit));
    println!("  ICA credit:           {}", format_cop(totals.total_ica_credit));

    if let Some(groups) = groups {
        let rows: Vec<GroupRow> = groups
            .iter()
            .map(|(group, stats)| GroupRow {
                group: group.clone(),
                count: stats.expense_count,
                gross: format_cop(stats.total_gross_value),
                vat: format_cop(stats.total_vat),
                withholdings: format_cop(stats.total_withholdings),
                net_payable: format_cop(stats.total_net_payable),
            })
            .collect();
        println!();
        println!(
            "{}",
            Table::new(&rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        );
    }
}
