use super::calculator::TaxCalculationResult;
use super::expense::StoredBreakdown;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tax fields of an expense that carries a computed breakdown.
///
/// Any field may be absent on partially populated rows; absent fields count as zero.
pub trait ExpenseTaxFields {
    fn gross_value(&self) -> Option<Decimal>;
    fn vat(&self) -> Option<Decimal>;
    fn rete_fuente(&self) -> Option<Decimal>;
    fn rete_iva(&self) -> Option<Decimal>;
    fn rete_ica(&self) -> Option<Decimal>;
    fn net_payable(&self) -> Option<Decimal>;
}

impl ExpenseTaxFields for TaxCalculationResult {
    fn gross_value(&self) -> Option<Decimal> {
        Some(self.gross_value)
    }
    fn vat(&self) -> Option<Decimal> {
        Some(self.vat)
    }
    fn rete_fuente(&self) -> Option<Decimal> {
        Some(self.rete_fuente)
    }
    fn rete_iva(&self) -> Option<Decimal> {
        Some(self.rete_iva)
    }
    fn rete_ica(&self) -> Option<Decimal> {
        Some(self.rete_ica)
    }
    fn net_payable(&self) -> Option<Decimal> {
        Some(self.net_payable)
    }
}

impl ExpenseTaxFields for StoredBreakdown {
    fn gross_value(&self) -> Option<Decimal> {
        self.gross_value
    }
    fn vat(&self) -> Option<Decimal> {
        self.vat
    }
    fn rete_fuente(&self) -> Option<Decimal> {
        self.rete_fuente
    }
    fn rete_iva(&self) -> Option<Decimal> {
        self.rete_iva
    }
    fn rete_ica(&self) -> Option<Decimal> {
        self.rete_ica
    }
    fn net_payable(&self) -> Option<Decimal> {
        self.net_payable
    }
}

impl<T: ExpenseTaxFields + ?Sized> ExpenseTaxFields for &T {
    fn gross_value(&self) -> Option<Decimal> {
        (**self).gross_value()
    }
    fn vat(&self) -> Option<Decimal> {
        (**self).vat()
    }
    fn rete_fuente(&self) -> Option<Decimal> {
        (**self).rete_fuente()
    }
    fn rete_iva(&self) -> Option<Decimal> {
        (**self).rete_iva()
    }
    fn rete_ica(&self) -> Option<Decimal> {
        (**self).rete_ica()
    }
    fn net_payable(&self) -> Option<Decimal> {
        (**self).net_payable()
    }
}

/// Portfolio totals over a set of expense breakdowns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateTaxStats {
    pub expense_count: usize,
    pub total_gross_value: Decimal,
    pub total_vat: Decimal,
    pub total_rete_fuente: Decimal,
    pub total_rete_iva: Decimal,
    pub total_rete_ica: Decimal,
    pub total_net_payable: Decimal,
    pub total_withholdings: Decimal,
    /// Σvat − Σrete_iva
    pub total_vat_deductible: Decimal,
    pub total_income_tax_credit: Decimal,
    pub total_ica_credit: Decimal,
}

impl AggregateTaxStats {
    // Sums saturate at the Decimal bounds; stored rows are not range checked
    fn add_record<T: ExpenseTaxFields>(&mut self, record: &T) {
        let add = |total: Decimal, value: Option<Decimal>| {
            total.saturating_add(value.unwrap_or(Decimal::ZERO))
        };
        self.expense_count += 1;
        self.total_gross_value = add(self.total_gross_value, record.gross_value());
        self.total_vat = add(self.total_vat, record.vat());
        self.total_rete_fuente = add(self.total_rete_fuente, record.rete_fuente());
        self.total_rete_iva = add(self.total_rete_iva, record.rete_iva());
        self.total_rete_ica = add(self.total_rete_ica, record.rete_ica());
        self.total_net_payable = add(self.total_net_payable, record.net_payable());
    }

    // Derived totals are recomputed from the sums, never accumulated
    fn derive_totals(mut self) -> Self {
        self.total_withholdings = self
            .total_rete_fuente
            .saturating_add(self.total_rete_iva)
            .saturating_add(self.total_rete_ica);
        self.total_vat_deductible = self.total_vat.saturating_sub(self.total_rete_iva);
        self.total_income_tax_credit = self.total_rete_fuente;
        self.total_ica_credit = self.total_rete_ica;
        self
    }

    /// Combine two aggregates as if their records had been aggregated together
    pub fn merge(self, other: &AggregateTaxStats) -> AggregateTaxStats {
        AggregateTaxStats {
            expense_count: self.expense_count + other.expense_count,
            total_gross_value: self.total_gross_value.saturating_add(other.total_gross_value),
            total_vat: self.total_vat.saturating_add(other.total_vat),
            total_rete_fuente: self.total_rete_fuente.saturating_add(other.total_rete_fuente),
            total_rete_iva: self.total_rete_iva.saturating_add(other.total_rete_iva),
            total_rete_ica: self.total_rete_ica.saturating_add(other.total_rete_ica),
            total_net_payable: self.total_net_payable.saturating_add(other.total_net_payable),
            ..Default::default()
        }
        .derive_totals()
    }
}

/// Sum breakdowns into portfolio totals. An empty input gives all-zero stats.
pub fn aggregate<I>(records: I) -> AggregateTaxStats
where
    I: IntoIterator,
    I::Item: ExpenseTaxFields,
{
    let mut stats = AggregateTaxStats::default();
    for record in records {
        stats.add_record(&record);
    }
    stats.derive_totals()
}

/// Aggregate per group key, e.g. per category or retention type
pub fn aggregate_by<I, F>(records: I, mut key: F) -> BTreeMap<String, AggregateTaxStats>
where
    I: IntoIterator,
    I::Item: ExpenseTaxFields,
    F: FnMut(&I::Item) -> String,
{
    let mut groups: BTreeMap<String, AggregateTaxStats> = BTreeMap::new();
    for record in records {
        groups.entry(key(&record)).or_default().add_record(&record);
    }
    groups
        .into_iter()
        .map(|(k, stats)| (k, stats.derive_totals()))
        .collect()
}
