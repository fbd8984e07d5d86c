use super::classify::RetentionClassifier;
use super::config::EngineConfig;
use super::expense::ExpenseInput;
use super::gross::{bound_gross_value, resolve_gross_value};
use super::rates::{RateTable, RetentionType};
use rust_decimal::Decimal;
use serde::Serialize;

/// Full tax breakdown of one expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxCalculationResult {
    pub gross_value: Decimal,
    pub retention_type: RetentionType,
    pub rete_fuente_rate: Decimal,
    pub vat: Decimal,
    pub total_with_vat: Decimal,
    pub rete_fuente: Decimal,
    pub rete_iva: Decimal,
    pub rete_ica: Decimal,
    pub total_withholdings: Decimal,
    pub net_payable: Decimal,
    /// Gross value is 100% deductible
    pub deductible_cost: Decimal,
    pub vat_deductible: Decimal,
    pub income_tax_credit: Decimal,
    pub ica_credit: Decimal,
}

/// Computes expense tax breakdowns against an immutable configuration
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    rates: &'a RateTable,
    classifier: &'a RetentionClassifier,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        TaxCalculator {
            rates: config.rates(),
            classifier: config.classifier(),
        }
    }

    pub fn with_parts(rates: &'a RateTable, classifier: &'a RetentionClassifier) -> Self {
        TaxCalculator { rates, classifier }
    }

    /// Breakdown for a gross value.
    ///
    /// Negative values count as zero and values above `MAX_GROSS_VALUE` are
    /// capped there.
    ///
    /// Rete-IVA is only withheld from VAT-registered providers; everything
    /// else depends on the gross value and the subcategory's retention type.
    pub fn calculate(
        &self,
        gross_value: Decimal,
        subcategory_id: &str,
        provider_is_vat_registered: bool,
    ) -> TaxCalculationResult {
        let gross_value = bound_gross_value(gross_value);
        let retention_type = self.classifier.classify(subcategory_id);
        let rete_fuente_rate = self.rates.rete_fuente_rate(retention_type);

        let vat = gross_value * self.rates.vat_rate;
        let total_with_vat = gross_value + vat;
        let rete_fuente = gross_value * rete_fuente_rate;
        let rete_iva = if provider_is_vat_registered {
            vat * self.rates.rete_iva_fraction
        } else {
            Decimal::ZERO
        };
        let rete_ica = gross_value * self.rates.rete_ica_rate;
        let total_withholdings = rete_fuente + rete_iva + rete_ica;
        let net_payable = total_with_vat - total_withholdings;

        TaxCalculationResult {
            gross_value,
            retention_type,
            rete_fuente_rate,
            vat,
            total_with_vat,
            rete_fuente,
            rete_iva,
            rete_ica,
            total_withholdings,
            net_payable,
            deductible_cost: gross_value,
            vat_deductible: vat - rete_iva,
            income_tax_credit: rete_fuente,
            ica_credit: rete_ica,
        }
    }

    /// Resolve the gross value of a parsed expense and compute its breakdown
    pub fn calculate_expense(&self, expense: &ExpenseInput) -> TaxCalculationResult {
        let gross_value = resolve_gross_value(
            &expense.category,
            expense.amount,
            expense.miles,
            self.rates,
        );
        log::debug!(
            "Expense {} ({}/{}): gross {}",
            expense.id.as_deref().unwrap_or("-"),
            expense.category,
            expense.subcategory,
            gross_value
        );
        self.calculate(
            gross_value,
            &expense.subcategory,
            expense.provider_vat_registered,
        )
    }
}
