// 💵 Scenario Calculator - Three ways to price the same cost base
//
// Every scenario shares one formula:
//   contribution   = selling_price - total_variable_costs
//   margin         = contribution / selling_price
//   per hour       = contribution / estimated_hours_total
// Scenarios differ only in how the selling price is derived.

use crate::error::PricingError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CREDIT_CARD_FEE_PERCENT: f64 = 3.0;

// ============================================================================
// SCENARIO KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    TargetMargin,
    ManualPrice,
    PricePerItem,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::TargetMargin,
        ScenarioKind::ManualPrice,
        ScenarioKind::PricePerItem,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::TargetMargin => "target",
            ScenarioKind::ManualPrice => "manual",
            ScenarioKind::PricePerItem => "per-item",
        }
    }

    /// Column header in the totals sheet
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::TargetMargin => "Price on target CM%",
            ScenarioKind::ManualPrice => "Price on manual entry",
            ScenarioKind::PricePerItem => "Price on price/item",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// INPUTS
// ============================================================================

/// User-entered scenario values. Owned by the session, not by the quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInputs {
    pub contribution_percent_target: f64,
    pub manual_price: f64,
    pub price_per_item: f64,
}

impl ScenarioInputs {
    pub fn new(contribution_percent_target: f64, manual_price: f64, price_per_item: f64) -> Self {
        ScenarioInputs {
            contribution_percent_target,
            manual_price,
            price_per_item,
        }
    }
}

/// Aggregated figures every scenario is priced against
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBasis {
    pub total_variable_costs: f64,
    pub estimated_hours_total: f64,
}

impl CostBasis {
    pub fn new(total_variable_costs: f64, estimated_hours_total: f64) -> Self {
        CostBasis {
            total_variable_costs,
            estimated_hours_total,
        }
    }

    fn check(&self, scenario: &str) -> Result<(), PricingError> {
        if !self.total_variable_costs.is_finite() {
            return Err(PricingError::invalid_input(
                scenario,
                "total variable costs are not a finite number",
            ));
        }
        if !self.estimated_hours_total.is_finite() || self.estimated_hours_total < 0.0 {
            return Err(PricingError::invalid_input(
                scenario,
                format!(
                    "estimated hours total must be a non-negative number, got {}",
                    self.estimated_hours_total
                ),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SELLING PRICE STRATEGIES
// ============================================================================

/// Derives a scenario's selling price from the cost basis.
///
/// The three built-in scenarios report their `ScenarioKind`; host-defined
/// strategies only need a name and a label and reuse the same formula
/// through `evaluate_scenario`.
pub trait PricingStrategy {
    /// Short name used in logs and errors, e.g. `target`
    fn name(&self) -> &str;

    /// Column header, e.g. `Price on target CM%`
    fn label(&self) -> &str;

    fn kind(&self) -> Option<ScenarioKind> {
        None
    }

    fn selling_price(&self, basis: &CostBasis) -> Result<f64, PricingError>;
}

macro_rules! builtin_strategy {
    ($kind:expr) => {
        fn name(&self) -> &str {
            $kind.name()
        }

        fn label(&self) -> &str {
            $kind.label()
        }

        fn kind(&self) -> Option<ScenarioKind> {
            Some($kind)
        }
    };
}

/// Price that yields the target contribution margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetMargin {
    pub percent: f64,
}

impl PricingStrategy for TargetMargin {
    builtin_strategy!(ScenarioKind::TargetMargin);

    fn selling_price(&self, basis: &CostBasis) -> Result<f64, PricingError> {
        if !self.percent.is_finite() {
            return Err(PricingError::invalid_input(
                self.name(),
                "target contribution % is not a finite number",
            ));
        }
        // 100% divides by zero; above 100% the price turns negative
        if self.percent >= 100.0 {
            return Err(PricingError::invalid_input(
                self.name(),
                format!(
                    "target contribution % must be below 100, got {}",
                    self.percent
                ),
            ));
        }

        Ok(basis.total_variable_costs / (1.0 - self.percent / 100.0))
    }
}

/// Price typed in by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualPrice {
    pub price: f64,
}

impl PricingStrategy for ManualPrice {
    builtin_strategy!(ScenarioKind::ManualPrice);

    fn selling_price(&self, _basis: &CostBasis) -> Result<f64, PricingError> {
        entered_price(self.name(), self.price)
    }
}

/// Price entered per item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePerItem {
    pub price: f64,
}

impl PricingStrategy for PricePerItem {
    builtin_strategy!(ScenarioKind::PricePerItem);

    fn selling_price(&self, _basis: &CostBasis) -> Result<f64, PricingError> {
        entered_price(self.name(), self.price)
    }
}

// Entered prices pass through unchanged. Zero is allowed (margin becomes n/a),
// negative is not.
fn entered_price(scenario: &str, price: f64) -> Result<f64, PricingError> {
    if !price.is_finite() {
        return Err(PricingError::invalid_input(scenario, "price is not a finite number"));
    }
    if price < 0.0 {
        return Err(PricingError::invalid_input(
            scenario,
            format!("price must not be negative, got {}", price),
        ));
    }
    Ok(price)
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Strategy name, e.g. `target`
    pub scenario: String,
    pub label: String,
    pub selling_price: f64,
    pub contribution_dollars: f64,
    /// `None` when the selling price is 0
    pub contribution_percent: Option<f64>,
    /// `None` when no hours are estimated
    pub contribution_per_hour: Option<f64>,
    /// Card processing fee on this scenario's selling price
    pub credit_card_fee: f64,
}

pub type ScenarioOutcome = Result<ScenarioResult, PricingError>;

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResultSet {
    pub target: ScenarioOutcome,
    pub manual: ScenarioOutcome,
    pub per_item: ScenarioOutcome,
}

impl ScenarioResultSet {
    pub fn get(&self, kind: ScenarioKind) -> &ScenarioOutcome {
        match kind {
            ScenarioKind::TargetMargin => &self.target,
            ScenarioKind::ManualPrice => &self.manual,
            ScenarioKind::PricePerItem => &self.per_item,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioKind, &ScenarioOutcome)> {
        ScenarioKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Serializable form: the result, or the reason it is not available
    pub fn records(&self) -> Vec<ScenarioRecord> {
        self.iter()
            .map(|(kind, outcome)| match outcome {
                Ok(result) => ScenarioRecord {
                    kind,
                    result: Some(result.clone()),
                    error: None,
                },
                Err(err) => ScenarioRecord {
                    kind,
                    result: None,
                    error: Some(err.to_string()),
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub kind: ScenarioKind,
    pub result: Option<ScenarioResult>,
    pub error: Option<String>,
}

// ============================================================================
// CALCULATOR
// ============================================================================

/// Evaluate one scenario. Numeric edge cases come back as `None` metrics or
/// an `InvalidScenarioInput` error, never as NaN or infinity.
pub fn evaluate_scenario(
    strategy: &dyn PricingStrategy,
    basis: &CostBasis,
    credit_card_fee_percent: f64,
) -> ScenarioOutcome {
    let name = strategy.name();
    let outcome = basis.check(name).and_then(|_| strategy.selling_price(basis));

    let selling_price = match outcome {
        Ok(price) => price,
        Err(err) => {
            tracing::warn!(scenario = name, error = %err, "scenario not applicable");
            return Err(err);
        }
    };

    let contribution_dollars = selling_price - basis.total_variable_costs;

    Ok(ScenarioResult {
        scenario: name.to_string(),
        label: strategy.label().to_string(),
        selling_price,
        contribution_dollars,
        contribution_percent: ratio(contribution_dollars, selling_price),
        contribution_per_hour: ratio(contribution_dollars, basis.estimated_hours_total),
        credit_card_fee: selling_price * credit_card_fee_percent / 100.0,
    })
}

/// `None` for a zero divisor or a non-finite quotient
pub(crate) fn ratio(numerator: f64, divisor: f64) -> Option<f64> {
    if divisor == 0.0 {
        return None;
    }
    let value = numerator / divisor;
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioCalculator {
    pub credit_card_fee_percent: f64,
}

impl ScenarioCalculator {
    pub fn new(credit_card_fee_percent: f64) -> Self {
        ScenarioCalculator {
            credit_card_fee_percent,
        }
    }

    /// One strategy with this calculator's fee
    pub fn evaluate(&self, strategy: &dyn PricingStrategy, basis: &CostBasis) -> ScenarioOutcome {
        evaluate_scenario(strategy, basis, self.credit_card_fee_percent)
    }

    pub fn compute(&self, basis: &CostBasis, inputs: &ScenarioInputs) -> ScenarioResultSet {
        let target = TargetMargin {
            percent: inputs.contribution_percent_target,
        };
        let manual = ManualPrice {
            price: inputs.manual_price,
        };
        let per_item = PricePerItem {
            price: inputs.price_per_item,
        };

        ScenarioResultSet {
            target: self.evaluate(&target, basis),
            manual: self.evaluate(&manual, basis),
            per_item: self.evaluate(&per_item, basis),
        }
    }
}

impl Default for ScenarioCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_CREDIT_CARD_FEE_PERCENT)
    }
}

/// All three scenarios against one cost base, with the default fee
pub fn compute_scenarios(
    total_variable_costs: f64,
    estimated_hours_total: f64,
    inputs: &ScenarioInputs,
) -> ScenarioResultSet {
    ScenarioCalculator::default().compute(
        &CostBasis::new(total_variable_costs, estimated_hours_total),
        inputs,
    )
}

// ============================================================================
// TESTS
// ============================================================================
