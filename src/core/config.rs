use super::classify::RetentionClassifier;
use super::rates::{RateTable, RetentionType};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Rate configuration shipped with the binary
pub const BUILTIN_CONFIG: &str = include_str!("../../config/rates-co-2024.json");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config version must not be empty")]
    EmptyVersion,
    #[error("rate {name} must be between 0 and 1, got {value}")]
    RateOutOfRange { name: String, value: Decimal },
    #[error("mileage rate must not be negative, got {0}")]
    NegativeMileageRate(Decimal),
    #[error("empty subcategory identifier in classification table")]
    EmptySubcategory,
    #[error("duplicate subcategory in classification table: {0}")]
    DuplicateSubcategory(String),
}

/// One row of the subcategory classification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassificationEntry {
    /// Subcategory identifier as stored on expenses
    pub subcategory: String,
    /// Business expense category the subcategory belongs to
    pub category: String,
    pub retention_type: RetentionType,
}

/// Versioned configuration artifact as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Identifies the rate set, e.g. "CO-2024"
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rates: RateTable,
    pub classification: Vec<ClassificationEntry>,
}

/// Validated, immutable engine configuration.
///
/// Loaded once per process and shared by reference.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    file: ConfigFile,
    classifier: RetentionClassifier,
    fingerprint: String,
}

impl EngineConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_CONFIG)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(raw)?;
        Self::build(file, fingerprint(raw.as_bytes()))
    }

    /// Build a configuration from values, e.g. an alternate rate set in tests
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let raw = serde_json::to_vec(&file)?;
        Self::build(file, fingerprint(&raw))
    }

    fn build(file: ConfigFile, fingerprint: String) -> Result<Self, ConfigError> {
        validate(&file)?;
        let classifier = RetentionClassifier::new(
            file.classification
                .iter()
                .map(|entry| (entry.subcategory.clone(), entry.retention_type)),
        );
        log::debug!(
            "Loaded config {} with {} classified subcategories",
            file.version,
            classifier.len()
        );
        Ok(EngineConfig {
            file,
            classifier,
            fingerprint,
        })
    }

    pub fn version(&self) -> &str {
        &self.file.version
    }

    pub fn description(&self) -> Option<&str> {
        self.file.description.as_deref()
    }

    pub fn rates(&self) -> &RateTable {
        &self.file.rates
    }

    pub fn classifier(&self) -> &RetentionClassifier {
        &self.classifier
    }

    pub fn classification(&self) -> &[ClassificationEntry] {
        &self.file.classification
    }

    /// SHA-256 of the artifact the configuration was loaded from
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn fingerprint(raw: &[u8]) -> String {
    hex::encode(Sha256::digest(raw))
}

fn validate(file: &ConfigFile) -> Result<(), ConfigError> {
    if file.version.trim().is_empty() {
        return Err(ConfigError::EmptyVersion);
    }

    let rates = &file.rates;
    let fractions = [
        ("vat_rate", rates.vat_rate),
        ("rete_iva_fraction", rates.rete_iva_fraction),
        ("rete_ica_rate", rates.rete_ica_rate),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .chain(RetentionType::ALL.into_iter().map(|t| {
        (format!("rete_fuente.{}", t.key()), rates.rete_fuente_rate(t))
    }));
    for (name, value) in fractions {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(ConfigError::RateOutOfRange { name, value });
        }
    }
    if rates.mileage_rate < Decimal::ZERO {
        return Err(ConfigError::NegativeMileageRate(rates.mileage_rate));
    }

    let mut seen = HashSet::new();
    for entry in &file.classification {
        if entry.subcategory.trim().is_empty() {
            return Err(ConfigError::EmptySubcategory);
        }
        if !seen.insert(entry.subcategory.as_str()) {
            return Err(ConfigError::DuplicateSubcategory(entry.subcategory.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn builtin_config_loads() {
        let config = EngineConfig::builtin().unwrap();
        assert_eq!(config.version(), "CO-2024");
        assert_eq!(config.rates().vat_rate, dec!(0.19));
        assert_eq!(config.rates().rete_iva_fraction, dec!(0.50));
        assert_eq!(config.rates().rete_ica_rate, dec!(0.005));
        assert_eq!(config.rates().mileage_rate, dec!(0.67));
        assert_eq!(
            config.rates().rete_fuente_rate(RetentionType::ProfessionalFees),
            dec!(0.10)
        );
        assert!(config.classifier().len() >= 35);
    }

    #[test]
    fn builtin_classification_covers_six_categories() {
        let config = EngineConfig::builtin().unwrap();
        let categories: HashSet<_> = config
            .classification()
            .iter()
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(categories.len(), 6);
        assert_eq!(
            config.classifier().classify("office_rent"),
            RetentionType::Leasing
        );
        assert_eq!(
            config.classifier().classify("vehicle_purchase"),
            RetentionType::Purchases
        );
    }

    #[test]
    fn fingerprint_is_stable_sha256() {
        let a = EngineConfig::builtin().unwrap();
        let b = EngineConfig::from_json(BUILTIN_CONFIG).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    fn file() -> ConfigFile {
        serde_json::from_str(BUILTIN_CONFIG).unwrap()
    }

    #[test]
    fn rejects_empty_version() {
        let mut f = file();
        f.version = " ".to_string();
        assert!(matches!(
            EngineConfig::from_file(f),
            Err(ConfigError::EmptyVersion)
        ));
    }

    #[test]
    fn rejects_rate_above_one() {
        let mut f = file();
        f.rates.vat_rate = dec!(19);
        match EngineConfig::from_file(f) {
            Err(ConfigError::RateOutOfRange { name, value }) => {
                assert_eq!(name, "vat_rate");
                assert_eq!(value, dec!(19));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_negative_rete_fuente_rate() {
        let mut f = file();
        f.rates.rete_fuente.leasing = dec!(-0.01);
        match EngineConfig::from_file(f) {
            Err(ConfigError::RateOutOfRange { name, .. }) => {
                assert_eq!(name, "rete_fuente.leasing")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn mileage_rate_may_exceed_one() {
        let mut f = file();
        f.rates.mileage_rate = dec!(1500);
        assert!(EngineConfig::from_file(f).is_ok());

        let mut f = file();
        f.rates.mileage_rate = dec!(-1);
        assert!(matches!(
            EngineConfig::from_file(f),
            Err(ConfigError::NegativeMileageRate(_))
        ));
    }

    #[test]
    fn rejects_duplicate_subcategory() {
        let mut f = file();
        let dup = f.classification[0].clone();
        f.classification.push(dup);
        assert!(matches!(
            EngineConfig::from_file(f),
            Err(ConfigError::DuplicateSubcategory(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = BUILTIN_CONFIG.replacen("\"version\"", "\"year\": 2024, \"version\"", 1);
        assert!(matches!(
            EngineConfig::from_json(&raw),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::from_path(Path::new("/nonexistent/rates.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/rates.json"));
    }
}
