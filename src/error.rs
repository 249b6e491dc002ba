// ⚠️ Pricing Errors
// Numeric edge cases travel as values; only column misuse is a hard failure

use crate::columns::ColumnId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// A scenario's selling price cannot be derived from the given inputs
    #[error("invalid input for {scenario} scenario: {reason}")]
    InvalidScenarioInput {
        scenario: String,
        reason: String,
    },

    /// `aggregate` was called on a column whose strategy is `none`
    #[error("column '{column}' has no aggregation strategy")]
    MissingAggregationStrategy { column: ColumnId },

    #[error("unknown column '{0}'")]
    UnknownColumn(ColumnId),

    #[error("product index {index} out of range (quote has {len} products)")]
    ProductIndexOutOfRange { index: usize, len: usize },

    #[error("product '{product}' already has a cost named '{name}'")]
    DuplicateCostName { product: String, name: String },

    #[error("no product has a cost named '{name}'")]
    UnknownCostName { name: String },

    #[error("product '{product}' has negative estimated hours ({hours})")]
    NegativeEstimatedHours { product: String, hours: f64 },

    #[error("{field} must be a finite number")]
    NonFiniteValue { field: String },
}

impl PricingError {
    pub fn invalid_input(scenario: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::InvalidScenarioInput {
            scenario: scenario.into(),
            reason: reason.into(),
        }
    }

    pub fn is_invalid_scenario_input(&self) -> bool {
        matches!(self, PricingError::InvalidScenarioInput { .. })
    }
}
