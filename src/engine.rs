// ⚖️ Pricing Engine - Quote in, columns, aggregates and scenarios out
//
// Flow:
//   Quote → column schema → aggregates → cost basis → three scenarios → totals sheet
// Everything is recomputed from the quote passed in; the engine holds no quote state.

use crate::aggregate::{aggregate_by_id, Aggregates};
use crate::cache::{Derivation, PricingCache};
use crate::columns::{derive_columns, ColumnDefinition, ColumnId};
use crate::config::PricingConfig;
use crate::error::PricingError;
use crate::quote::{Product, Quote};
use crate::scenario::{ScenarioCalculator, ScenarioInputs, ScenarioRecord, ScenarioResultSet};
use crate::totals::{contribution_footers, TotalsRow, TotalsSheet};
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// PRICING REPORT
// ============================================================================

/// Everything the presentation layer needs for one quote + inputs
#[derive(Debug, Clone, Serialize)]
pub struct PricingReport {
    pub quote_hash: String,
    pub product_count: usize,
    pub inputs: ScenarioInputs,
    pub columns: Vec<ColumnDefinition>,
    pub aggregates: Aggregates,
    #[serde(skip)]
    pub scenarios: ScenarioResultSet,
    #[serde(rename = "scenarios")]
    pub scenario_records: Vec<ScenarioRecord>,
    /// Footers of the contribution columns, per scenario
    pub contribution_footers: Vec<TotalsRow>,
    pub totals: TotalsSheet,
    pub generated_at: DateTime<Utc>,
}

impl PricingReport {
    pub fn summary(&self) -> String {
        let target = match &self.scenarios.target {
            Ok(result) => format!("${:.2}", result.selling_price),
            Err(_) => "n/a".to_string(),
        };
        format!(
            "Quote {} ({} products): total variable costs ${:.2}, {:.2} estimated hours, target price {}",
            &self.quote_hash[..self.quote_hash.len().min(12)],
            self.product_count,
            self.aggregates.total_variable_costs(),
            self.aggregates.estimated_hours_total(),
            target
        )
    }
}

// ============================================================================
// PRICING ENGINE
// ============================================================================

pub struct PricingEngine {
    calculator: ScenarioCalculator,
}

impl PricingEngine {
    pub fn new() -> Self {
        PricingEngine {
            calculator: ScenarioCalculator::default(),
        }
    }

    pub fn with_config(config: &PricingConfig) -> Self {
        PricingEngine {
            calculator: ScenarioCalculator::new(config.credit_card_fee_percent),
        }
    }

    pub fn credit_card_fee_percent(&self) -> f64 {
        self.calculator.credit_card_fee_percent
    }

    /// Full column set (static + dynamic + computed) for the current quote
    pub fn derive_columns(&self, quote: &Quote) -> Vec<ColumnDefinition> {
        derive_columns(quote)
    }

    /// Aggregate one column of `quote`'s schema over `products`
    pub fn aggregate(
        &self,
        quote: &Quote,
        column: &ColumnId,
        products: &[Product],
    ) -> Result<f64, PricingError> {
        quote.check_cost_names()?;
        aggregate_by_id(&derive_columns(quote), column, products)
    }

    /// Fails with `DuplicateCostName` when a product repeats a cost name
    pub fn aggregates(&self, quote: &Quote) -> Result<Aggregates, PricingError> {
        quote.check_cost_names()?;
        Aggregates::compute(&derive_columns(quote), quote.products())
    }

    pub fn compute_scenarios(
        &self,
        quote: &Quote,
        inputs: &ScenarioInputs,
    ) -> Result<ScenarioResultSet, PricingError> {
        let aggregates = self.aggregates(quote)?;
        Ok(self.calculator.compute(&aggregates.cost_basis(), inputs))
    }

    /// Columns, aggregates, scenarios and the totals sheet in one pass.
    /// Fails with `DuplicateCostName` when a product repeats a cost name.
    pub fn price(&self, quote: &Quote, inputs: &ScenarioInputs) -> Result<PricingReport, PricingError> {
        let derivation = Derivation::compute(quote)?;
        Ok(self.build_report(quote, derivation, inputs))
    }

    /// Same as `price`, reusing columns and aggregates from `cache` while the
    /// quote content is unchanged
    pub fn price_cached(
        &self,
        cache: &mut PricingCache,
        quote: &Quote,
        inputs: &ScenarioInputs,
    ) -> Result<PricingReport, PricingError> {
        let derivation = cache.get_or_derive(quote)?.clone();
        Ok(self.build_report(quote, derivation, inputs))
    }

    fn build_report(&self, quote: &Quote, derivation: Derivation, inputs: &ScenarioInputs) -> PricingReport {
        let Derivation {
            quote_hash,
            columns,
            aggregates,
        } = derivation;
        let span = tracing::debug_span!("price", hash = %quote_hash, products = quote.len());
        let _enter = span.enter();

        let scenarios = self.calculator.compute(&aggregates.cost_basis(), inputs);
        let totals = TotalsSheet::build(&columns, &aggregates, &scenarios);
        let footers = contribution_footers(&columns, &aggregates, &scenarios);

        tracing::debug!(
            total_variable_costs = aggregates.total_variable_costs(),
            estimated_hours = aggregates.estimated_hours_total(),
            "priced quote"
        );

        PricingReport {
            quote_hash,
            product_count: quote.len(),
            inputs: *inputs,
            columns,
            aggregates,
            scenario_records: scenarios.records(),
            scenarios,
            contribution_footers: footers,
            totals,
            generated_at: Utc::now(),
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationStrategy;

    fn create_test_quote() -> Quote {
        Quote::from_products(vec![
            Product::new("P1")
                .with_hours(2.0)
                .with_cost("shipping", 10.0)
                .with_cost("packaging", 5.0),
            Product::new("P2").with_hours(3.0).with_cost("shipping", 8.0),
        ])
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_end_to_end_two_products() {
        let engine = PricingEngine::new();
        let quote = create_test_quote();

        let aggregates = engine.aggregates(&quote).unwrap();
        assert_eq!(aggregates.total_variable_costs(), 23.0);
        assert_eq!(aggregates.estimated_hours_total(), 5.0);

        let scenarios = engine
            .compute_scenarios(&quote, &ScenarioInputs::new(25.0, 0.0, 0.0))
            .unwrap();
        let target = scenarios.target.unwrap();
        assert_close(target.selling_price, 30.67, 0.005);
        assert_close(target.contribution_dollars, 7.67, 0.005);
        assert_close(target.contribution_per_hour.unwrap(), 1.53, 0.005);
    }

    #[test]
    fn test_aggregate_by_column_id() {
        let engine = PricingEngine::new();
        let quote = create_test_quote();
        let shipping = ColumnId::dynamic_cost("shipping");

        assert_eq!(engine.aggregate(&quote, &shipping, quote.products()), Ok(18.0));
        assert_eq!(engine.aggregate(&quote, &shipping, &[]), Ok(0.0));
        assert!(matches!(
            engine.aggregate(&quote, &ColumnId::name(), quote.products()),
            Err(PricingError::MissingAggregationStrategy { .. })
        ));
    }

    #[test]
    fn test_empty_quote() {
        let engine = PricingEngine::new();
        let quote = Quote::new();

        for column in engine
            .derive_columns(&quote)
            .iter()
            .filter(|c| c.aggregation == AggregationStrategy::Sum)
        {
            assert_eq!(engine.aggregate(&quote, &column.id, quote.products()), Ok(0.0));
        }

        let scenarios = engine
            .compute_scenarios(&quote, &ScenarioInputs::default())
            .unwrap();
        for (_, outcome) in scenarios.iter() {
            assert_eq!(outcome.as_ref().unwrap().contribution_per_hour, None);
        }
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let engine = PricingEngine::new();
        let quote = create_test_quote();
        let inputs = ScenarioInputs::new(25.0, 40.0, 35.0);

        assert_eq!(engine.derive_columns(&quote), engine.derive_columns(&quote));
        assert_eq!(
            engine.compute_scenarios(&quote, &inputs).unwrap(),
            engine.compute_scenarios(&quote, &inputs).unwrap()
        );
    }

    #[test]
    fn test_edit_then_recompute() {
        let engine = PricingEngine::new();
        let quote = create_test_quote();
        let inputs = ScenarioInputs::new(25.0, 0.0, 0.0);

        let edited = quote
            .with_product(Product::new("P3").with_hours(1.0).with_cost("insurance", 7.0));
        let before = engine.aggregates(&quote).unwrap();
        let after = engine.aggregates(&edited).unwrap();

        assert_eq!(before.total_variable_costs(), 23.0);
        assert_eq!(after.total_variable_costs(), 30.0);
        assert_eq!(after.get(&ColumnId::dynamic_cost("insurance")), Some(7.0));
        assert_close(
            engine
                .compute_scenarios(&edited, &inputs)
                .unwrap()
                .target
                .unwrap()
                .selling_price,
            40.0,
            1e-9,
        );
    }

    #[test]
    fn test_config_fee_flows_into_scenarios() {
        let config = PricingConfig {
            credit_card_fee_percent: 10.0,
            ..PricingConfig::default()
        };
        let engine = PricingEngine::with_config(&config);
        let scenarios = engine
            .compute_scenarios(&create_test_quote(), &ScenarioInputs::new(0.0, 100.0, 0.0))
            .unwrap();

        assert_close(scenarios.manual.unwrap().credit_card_fee, 10.0, 1e-9);
    }

    #[test]
    fn test_price_report() {
        let engine = PricingEngine::new();
        let quote = create_test_quote();
        let report = engine
            .price(&quote, &ScenarioInputs::new(100.0, 30.0, 0.0))
            .unwrap();

        assert_eq!(report.quote_hash, quote.content_hash());
        assert_eq!(report.product_count, 2);
        assert_eq!(report.scenario_records.len(), 3);
        assert!(report.scenarios.target.is_err());
        assert!(report.summary().contains("target price n/a"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenarios"][0]["kind"], "target_margin");
        assert!(json["scenarios"][0]["error"].is_string());
        assert_eq!(json["product_count"], 2);
    }

    #[test]
    fn test_duplicate_cost_names_are_rejected() {
        let engine = PricingEngine::new();
        let mut product = Product::new("P3").with_hours(1.0).with_cost("shipping", 10.0);
        product.costs.push(crate::quote::Cost::new("shipping", 5.0));
        let quote = create_test_quote().with_product(product);
        let inputs = ScenarioInputs::new(25.0, 0.0, 0.0);

        let expected = PricingError::DuplicateCostName {
            product: "P3".to_string(),
            name: "shipping".to_string(),
        };
        assert_eq!(engine.price(&quote, &inputs).unwrap_err(), expected);
        assert_eq!(engine.compute_scenarios(&quote, &inputs).unwrap_err(), expected);
        assert_eq!(engine.aggregates(&quote).unwrap_err(), expected);
    }

    #[test]
    fn test_price_cached_matches_price() {
        let engine = PricingEngine::new();
        let mut cache = PricingCache::new();
        let quote = create_test_quote();
        let inputs = ScenarioInputs::new(25.0, 40.0, 35.0);

        let direct = engine.price(&quote, &inputs).unwrap();
        let first = engine.price_cached(&mut cache, &quote, &inputs).unwrap();
        let second = engine
            .price_cached(&mut cache, &quote, &ScenarioInputs::new(30.0, 40.0, 35.0))
            .unwrap();

        assert_eq!(first.quote_hash, direct.quote_hash);
        assert_eq!(first.columns, direct.columns);
        assert_eq!(first.scenarios, direct.scenarios);
        assert_eq!(first.totals, direct.totals);
        assert_ne!(second.scenarios, first.scenarios);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_report_carries_contribution_footers() {
        let engine = PricingEngine::new();
        let report = engine
            .price(&create_test_quote(), &ScenarioInputs::new(0.0, 33.0, 0.0))
            .unwrap();

        assert_eq!(report.contribution_footers.len(), 3);
        assert_eq!(report.contribution_footers[1].label, "Contribution / hour");
        assert_eq!(report.contribution_footers[1].values[1], Some(2.0));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["contribution_footers"][2]["values"][1], 5.0);
    }
}
