pub mod calculate;
pub mod expenses;
pub mod rates;
pub mod schema;
pub mod summary;
pub mod validate;

use anyhow::Context;
use chrono::Datelike;
use cotax::core::{EngineConfig, ExpenseRecord, StoredBreakdown};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Load the rate configuration once for the whole run
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading rate configuration {}", path.display()))?,
        None => EngineConfig::builtin().context("loading built-in rate configuration")?,
    };
    log::info!(
        "Using rates {} ({} subcategories, sha256 {})",
        config.version(),
        config.classifier().len(),
        &config.fingerprint()[..12]
    );
    Ok(config)
}

/// Read expense records from a CSV or JSON file (or stdin with "-")
pub fn read_expenses(path: &Path) -> anyhow::Result<Vec<ExpenseRecord>> {
    let (buffer, json) = read_input(path)?;
    let records = if json {
        cotax::core::read_json(buffer.as_slice())
    } else {
        cotax::core::read_csv(buffer.as_slice())
    };
    records.with_context(|| format!("reading expenses from {}", path.display()))
}

/// Read previously computed breakdown rows (CSV)
pub fn read_stored_breakdowns(path: &Path) -> anyhow::Result<Vec<StoredBreakdown>> {
    let (buffer, _) = read_input(path)?;
    cotax::core::read_breakdowns_csv(buffer.as_slice())
        .with_context(|| format!("reading breakdowns from {}", path.display()))
}

fn read_input(path: &Path) -> anyhow::Result<(Vec<u8>, bool)> {
    let mut buffer = Vec::new();
    if path.as_os_str() == "-" {
        BufReader::new(io::stdin().lock()).read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        let json = buffer
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{');
        Ok((buffer, json))
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        BufReader::new(file).read_to_end(&mut buffer)?;
        let json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        Ok((buffer, json))
    }
}

/// Record selection shared by the reporting commands
#[derive(Debug, Clone, Default)]
pub struct RecordFilter<'a> {
    pub year: Option<i32>,
    pub category: Option<&'a str>,
}

impl RecordFilter<'_> {
    pub fn matches(&self, date: Option<chrono::NaiveDate>, category: Option<&str>) -> bool {
        if let Some(year) = self.year {
            if date.map(|d| d.year()) != Some(year) {
                return false;
            }
        }
        if let Some(wanted) = self.category {
            if !category.is_some_and(|c| c.eq_ignore_ascii_case(wanted)) {
                return false;
            }
        }
        true
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        parts.push(self.year.map_or("All Years".to_string(), |y| y.to_string()));
        if let Some(category) = self.category {
            parts.push(category.to_string());
        }
        parts.join(", ")
    }
}
