use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

use cmd::calculate::CalculateCommand;
use cmd::expenses::ExpensesCommand;
use cmd::rates::RatesCommand;
use cmd::schema::SchemaCommand;
use cmd::summary::SummaryCommand;
use cmd::validate::ValidateCommand;

#[derive(Parser, Debug)]
#[command(name = "cotax", version, about = "Colombian expense tax calculator (IVA and withholdings)")]
struct Cli {
    /// Rate configuration file (defaults to the built-in rates)
    #[arg(long, global = true, env = "COTAX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tax breakdown of a single expense
    Calculate(CalculateCommand),
    /// Per-expense breakdowns for a file of expenses
    Expenses(ExpensesCommand),
    /// Aggregated totals for reporting
    Summary(SummaryCommand),
    /// Report data quality issues in an expense file
    Validate(ValidateCommand),
    /// Show the active rate table and subcategory classification
    Rates(RatesCommand),
    /// Print expected input formats
    Schema(SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = cmd::load_config(cli.config.as_deref())?;
    match &cli.command {
        Command::Calculate(c) => c.exec(&config),
        Command::Expenses(c) => c.exec(&config),
        Command::Summary(c) => c.exec(&config),
        Command::Validate(c) => c.exec(&config),
        Command::Rates(c) => c.exec(&config),
        Command::Schema(c) => c.exec(),
    }
}
