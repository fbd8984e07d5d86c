//! Validate command - surface data quality issues the engine would silently default

use crate::cmd::read_expenses;
use clap::Args;
use cotax::core::{EngineConfig, ExpenseWarning};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// CSV or JSON file containing expenses ("-" for stdin)
    #[arg(short, long)]
    expenses: PathBuf,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    subcategory: String,
    warning: ExpenseWarning,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput<'a> {
    config_version: &'a str,
    expense_count: usize,
    issue_count: usize,
    issues: &'a [ValidationIssue],
}

impl ValidateCommand {
    pub fn exec(&self, config: &EngineConfig) -> anyhow::Result<()> {
        let records = read_expenses(&self.expenses)?;

        let issues: Vec<ValidationIssue> = records
            .iter()
            .enumerate()
            .flat_map(|(i, record)| {
                record
                    .warnings(config)
                    .into_iter()
                    .map(move |warning| ValidationIssue {
                        row: i + 1,
                        id: record.id.clone(),
                        subcategory: record.subcategory.clone(),
                        message: warning.to_string(),
                        warning,
                    })
            })
            .collect();

        if self.json {
            let output = ValidationOutput {
                config_version: config.version(),
                expense_count: records.len(),
                issue_count: issues.len(),
                issues: &issues,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&issues, records.len());
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_text(issues: &[ValidationIssue], expense_count: usize) {
    println!();
    println!("VALIDATION RESULTS ({} expenses)", expense_count);
    println!();

    if issues.is_empty() {
        println!("\u{2713} No issues found.");
        return;
    }

    println!("\u{26A0} {} issue(s) found:", issues.len());
    println!();
    for (i, issue) in issues.iter().enumerate() {
        println!(
            "  {}. [{}] row {}{} ({})",
            i + 1,
            issue.warning.kind(),
            issue.row,
            issue
                .id
                .as_ref()
                .map(|id| format!(" id {}", id))
                .unwrap_or_default(),
            issue.subcategory
        );
        println!("     {}", issue.message);
        println!();
    }
}
