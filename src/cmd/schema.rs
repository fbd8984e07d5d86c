//! Schema command - print expected input formats

use clap::Args;
use cotax::core::{ConfigFile, ExpenseFile, ExpenseRecord};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the expense input format
    JsonSchema,
    /// JSON Schema for the rate configuration file
    ConfigSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(ExpenseFile);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::ConfigSchema => {
                let schema = schema_for!(ConfigFile);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => println!("{}", ExpenseRecord::csv_header().join(",")),
            SchemaFormat::CsvFields => print_csv_fields(),
        }
        Ok(())
    }
}

fn print_csv_fields() {
    println!("CSV Input Format");
    println!("================");
    println!();
    for field in ExpenseRecord::csv_schema() {
        let req = if field.required { "required" } else { "optional" };
        println!("{:24} ({:8})  {}", field.name, req, field.description);
    }
    println!();
    println!("amount and miles accept numbers or numeric text; anything else counts as 0");
}
