//! E2E tests for the cotax commands

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::str::FromStr;

fn cotax(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cotax"))
        .args(args)
        .env_remove("COTAX_CONFIG")
        .output()
        .expect("Failed to execute command")
}

fn cotax_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cotax"))
        .args(args)
        .env_remove("COTAX_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input)
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

/// Single expense, registered provider
#[test]
fn calculate_services_expense() {
    let output = cotax(&["calculate", "--amount", "1000000", "--subcategory", "utilities"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("EXPENSE BREAKDOWN (CO-2024)"));
    assert!(stdout.contains("Servicios"));
    assert!(stdout.contains("$ 190.000"));
    assert!(stdout.contains("$ 140.000"));
    assert!(stdout.contains("$ 1.050.000"));
}

/// No Rete-IVA for providers outside the IVA regime
#[test]
fn calculate_unregistered_provider_json() {
    let output = cotax(&[
        "calculate",
        "--amount",
        "1000000",
        "--subcategory",
        "utilities",
        "--not-vat-registered",
        "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["config_version"], "CO-2024");
    assert_eq!(json["provider_vat_registered"], false);
    assert_eq!(json["retention_type"], "services");
    assert_eq!(decimal(&json["rete_iva"]), Decimal::ZERO);
    assert_eq!(decimal(&json["total_withholdings"]), dec!(45000));
    assert_eq!(decimal(&json["net_payable"]), dec!(1145000));
}

/// Mileage is valued at the configured rate per mile
#[test]
fn calculate_mileage() {
    let output = cotax(&[
        "calculate",
        "--miles",
        "100",
        "--subcategory",
        "mileage_reimbursement",
        "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["category"], "mileage");
    assert_eq!(decimal(&json["gross_value"]), dec!(67.00));
}

/// Unknown subcategories still get a breakdown at the Services rate
#[test]
fn calculate_unmapped_subcategory() {
    let output = cotax(&[
        "calculate",
        "--amount",
        "1000000",
        "--subcategory",
        "unmapped_xyz",
        "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["retention_type"], "services");
    assert_eq!(decimal(&json["rete_fuente_rate"]), dec!(0.04));
    assert_eq!(decimal(&json["rete_fuente"]), dec!(40000));
}

/// Mileage without miles is computed as zero and flagged
#[test]
fn calculate_mileage_without_miles_warns() {
    let output = Command::new(env!("CARGO_BIN_EXE_cotax"))
        .args([
            "calculate",
            "--category",
            "mileage",
            "--amount",
            "5000",
            "--subcategory",
            "mileage_reimbursement",
            "--json",
        ])
        .env_remove("COTAX_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decimal(&json["gross_value"]), Decimal::ZERO);
    assert!(String::from_utf8_lossy(&output.stderr).contains("No miles given, treated as 0"));
}

#[test]
fn calculate_requires_amount_or_miles() {
    let output = cotax(&["calculate", "--subcategory", "utilities"]);
    assert!(!output.status.success());
}

/// An alternate configuration file replaces the built-in rates
#[test]
fn alternate_config_file() {
    let output = cotax(&[
        "--config",
        "tests/data/rates-alt.json",
        "calculate",
        "--amount",
        "1000000",
        "--subcategory",
        "utilities",
        "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["config_version"], "CO-TEST-16");
    assert_eq!(decimal(&json["vat"]), dec!(160000));
    assert_eq!(decimal(&json["rete_fuente"]), dec!(60000));
    assert_eq!(decimal(&json["net_payable"]), dec!(1015000));
}

#[test]
fn missing_config_file_fails() {
    let output = cotax(&["--config", "tests/data/nope.json", "rates"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
}

/// Expenses table lists every record
#[test]
fn expenses_table() {
    let output = cotax(&["expenses", "-e", "tests/data/expenses.csv"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("Contadores SAS"));
    assert!(stdout.contains("Honorarios"));
    assert!(stdout.contains("Arrendamientos"));
    assert!(stdout.contains("$ 2.475.000"));
}

/// Filter by year
#[test]
fn expenses_filter_by_year() {
    let output = cotax(&["expenses", "-e", "tests/data/expenses.csv", "--year", "2025", "--csv"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("showroom_rent"));
    assert!(!stdout.contains("conversion_labor"));
}

/// Computed breakdowns as CSV
#[test]
fn expenses_csv_output() {
    let output = cotax(&["expenses", "-e", "tests/data/expenses.json", "--csv"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    let header = stdout.lines().next().unwrap();
    assert!(header.starts_with("id,date,category,subcategory,retention_type"));
    assert!(header.ends_with("total_withholdings,net_payable"));
    assert!(stdout.contains("advertising_transport"));
    assert!(stdout.contains("professional_fees"));
}

/// Summary totals for one year
#[test]
fn summary_json_for_year() {
    let output = cotax(&[
        "summary",
        "-e",
        "tests/data/expenses.csv",
        "--year",
        "2024",
        "--json",
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let totals = &json["totals"];
    assert_eq!(totals["expense_count"], 4);
    assert_eq!(decimal(&totals["total_gross_value"]), dec!(3700067));
    assert_eq!(decimal(&totals["total_vat"]), dec!(703012.73));
    assert_eq!(decimal(&totals["total_withholdings"]), dec!(646009.38));
    assert_eq!(decimal(&totals["total_net_payable"]), dec!(3757070.35));
    assert_eq!(
        decimal(&totals["total_vat_deductible"]),
        decimal(&totals["total_vat"]) - decimal(&totals["total_rete_iva"])
    );
    assert!(json["groups"].is_null());
    assert_eq!(json["config_fingerprint"].as_str().unwrap().len(), 64);
}

/// Text summary with per-category groups
#[test]
fn summary_text_by_category() {
    let output = cotax(&["summary", "-e", "tests/data/expenses.csv", "--by", "category"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("TAX SUMMARY (All Years) - rates CO-2024"));
    assert!(stdout.contains("WITHHOLDINGS"));
    assert!(stdout.contains("administration_finance"));
    assert!(stdout.contains("sales_commercialization"));
    assert!(stdout.contains("$ 6.922.070"));
}

/// Stored breakdown rows piped back in aggregate to the same totals
#[test]
fn summary_of_computed_breakdowns_from_stdin() {
    let csv = cotax(&["expenses", "-e", "tests/data/expenses.json", "--csv"]);
    assert!(csv.status.success(), "Command failed: {:?}", csv);

    let output = cotax_with_stdin(
        &["summary", "--computed", "-e", "-", "--by", "retention", "--json"],
        &csv.stdout,
    );
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["totals"]["expense_count"], 2);
    assert_eq!(decimal(&json["totals"]["total_gross_value"]), dec!(5500000));
    assert_eq!(decimal(&json["totals"]["total_net_payable"]), dec!(5947500));
    assert_eq!(
        decimal(&json["groups"]["professional_fees"]["total_rete_iva"]),
        Decimal::ZERO
    );
    assert_eq!(
        decimal(&json["groups"]["advertising_transport"]["total_withholdings"]),
        dec!(440000)
    );
}

/// Long decimal amounts reach the output unchanged
#[test]
fn expenses_keep_full_decimal_precision() {
    let input = "category,subcategory,amount\nadministration_finance,utilities,12345678.123456789\n";
    let output = cotax_with_stdin(&["expenses", "-e", "-", "--csv"], input.as_bytes());
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    let row = stdout.lines().nth(1).unwrap();
    assert!(row.contains(",12345678.123456789,"), "row: {}", row);
}

/// Non-numeric cells in stored breakdowns count as zero
#[test]
fn summary_of_computed_breakdowns_with_bad_cells() {
    let input = "id,gross_value,vat,net_payable\nx,abc,190,\ny,1000,190,1145\n";
    let output = cotax_with_stdin(&["summary", "--computed", "-e", "-", "--json"], input.as_bytes());
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["totals"]["expense_count"], 2);
    assert_eq!(decimal(&json["totals"]["total_gross_value"]), dec!(1000));
    assert_eq!(decimal(&json["totals"]["total_vat"]), dec!(380));
}

/// Issues exit with code 1
#[test]
fn validate_reports_issues() {
    let output = cotax(&["validate", "-e", "tests/data/dirty.csv", "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["issue_count"], 3);
    let kinds: Vec<_> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["warning"]["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        vec!["NegativeValueClamped", "UnmappedSubcategory", "UnparseableAmount"]
    );
}

#[test]
fn validate_clean_file() {
    let output = cotax(&["validate", "-e", "tests/data/expenses.csv"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("No issues found."));
}

#[test]
fn rates_json() {
    let output = cotax(&["rates", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["version"], "CO-2024");
    assert_eq!(json["default_retention_type"], "services");
    assert_eq!(decimal(&json["rates"]["vat_rate"]), dec!(0.19));
    assert_eq!(decimal(&json["rates"]["rete_fuente"]["professional_fees"]), dec!(0.10));
    assert!(json["classification"].as_array().unwrap().len() >= 35);
}

#[test]
fn rates_table() {
    let output = cotax(&["rates", "--category", "marketing_pr"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = stdout(&output);
    assert!(stdout.contains("0,5%"));
    assert!(stdout.contains("digital_advertising"));
    assert!(!stdout.contains("office_rent"));
}

#[test]
fn schema_csv_header() {
    let output = cotax(&["schema", "csv-header"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_eq!(
        stdout(&output).trim(),
        "id,date,supplier,description,category,subcategory,amount,miles,provider_vat_registered"
    );
}

#[test]
fn schema_json() {
    let output = cotax(&["schema", "json-schema"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["properties"]["expenses"].is_object());
}
