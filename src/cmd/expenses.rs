//! Expenses command - per-expense breakdowns with filtering

use crate::cmd::{read_expenses, RecordFilter};
use clap::Args;
use cotax::core::{
    write_breakdowns_csv, BreakdownRecord, EngineConfig, ExpenseInput, TaxCalculator,
};
use cotax::format::format_cop;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ExpensesCommand {
    /// CSV or JSON file containing expenses ("-" for stdin)
    #[arg(short, long)]
    expenses: PathBuf,

    /// Only expenses dated in this year
    #[arg(short, long)]
    year: Option<i32>,

    /// Only expenses in this category
    #[arg(short, long)]
    category: Option<String>,

    /// Output computed breakdowns as CSV instead of a formatted table
    #[arg(long)]
    csv: bool,
}

/// Row for the expenses table output
#[derive(Debug, Clone, Tabled)]
struct ExpenseRow {
    #[tabled(rename = "#")]
    row_num: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Supplier")]
    supplier: String,
    #[tabled(rename = "Subcategory")]
    subcategory: String,
    #[tabled(rename = "Retention")]
    retention: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "IVA")]
    vat: String,
    #[tabled(rename = "Rete-Fuente")]
    rete_fuente: String,
    #[tabled(rename = "Rete-IVA")]
    rete_iva: String,
    #[tabled(rename = "Rete-ICA")]
    rete_ica: String,
    #[tabled(rename = "Net Payable")]
    net_payable: String,
}

impl ExpensesCommand {
    pub fn exec(&self, config: &EngineConfig) -> anyhow::Result<()> {
        let filter = RecordFilter {
            year: self.year,
            category: self.category.as_deref(),
        };
        let calculator = TaxCalculator::new(config);

        let breakdowns: Vec<(ExpenseInput, BreakdownRecord)> = read_expenses(&self.expenses)?
            .into_iter()
            .map(ExpenseInput::from)
            .filter(|e| filter.matches(e.date, Some(e.category.as_str())))
            .map(|expense| {
                let result = calculator.calculate_expense(&expense);
                let record = BreakdownRecord::new(&expense, &result);
                (expense, record)
            })
            .collect();

        if self.csv {
            let records: Vec<_> = breakdowns.into_iter().map(|(_, r)| r).collect();
            write_breakdowns_csv(&records, io::stdout())?;
        } else {
            print_table(&breakdowns);
        }
        Ok(())
    }
}

fn print_table(breakdowns: &[(ExpenseInput, BreakdownRecord)]) {
    if breakdowns.is_empty() {
        println!("No expenses found matching filters");
        return;
    }

    let rows: Vec<ExpenseRow> = breakdowns
        .iter()
        .enumerate()
        .map(|(i, (expense, record))| ExpenseRow {
            row_num: i + 1,
            date: record
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            supplier: expense.supplier.clone().unwrap_or_default(),
            subcategory: record.subcategory.clone(),
            retention: record.retention_type.label().to_string(),
            gross: format_cop(record.gross_value),
            vat: format_cop(record.vat),
            rete_fuente: format_cop(record.rete_fuente),
            rete_iva: format_cop(record.rete_iva),
            rete_ica: format_cop(record.rete_ica),
            net_payable: format_cop(record.net_payable),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}
