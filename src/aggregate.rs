// ➕ Aggregator - Column summaries over the current rows
// Strategy tags map to functions here, in one place

use crate::columns::{find_column, ColumnDefinition, ColumnId};
use crate::error::PricingError;
use crate::quote::Product;
use crate::scenario::{ratio, CostBasis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// STRATEGIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStrategy {
    Sum,
    None,
}

/// Reduces one column's row values to a single number
pub type AggregationFn = fn(&[Option<f64>]) -> f64;

/// The strategy → function table. `None` has no function.
pub fn aggregation_fn(strategy: AggregationStrategy) -> Option<AggregationFn> {
    match strategy {
        AggregationStrategy::Sum => Some(sum),
        AggregationStrategy::None => None,
    }
}

/// Undefined values count as 0
fn sum(values: &[Option<f64>]) -> f64 {
    values.iter().map(|v| v.unwrap_or(0.0)).sum()
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// Summary value of `column` over `rows`. An empty row set aggregates to 0.
pub fn aggregate(column: &ColumnDefinition, rows: &[Product]) -> Result<f64, PricingError> {
    let Some(reduce) = aggregation_fn(column.aggregation) else {
        tracing::error!(column = %column.id, "aggregate called on a column without aggregation strategy");
        return Err(PricingError::MissingAggregationStrategy {
            column: column.id.clone(),
        });
    };

    let values: Vec<Option<f64>> = rows.iter().map(|row| column.value(row)).collect();
    Ok(reduce(&values))
}

/// Look up `id` in `columns`, then aggregate it
pub fn aggregate_by_id(
    columns: &[ColumnDefinition],
    id: &ColumnId,
    rows: &[Product],
) -> Result<f64, PricingError> {
    let column = find_column(columns, id).ok_or_else(|| PricingError::UnknownColumn(id.clone()))?;
    aggregate(column, rows)
}

// ============================================================================
// AGGREGATE SET
// ============================================================================

/// Aggregates of every summable column, computed together from one row set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    values: BTreeMap<ColumnId, f64>,
}

impl Aggregates {
    pub fn compute(columns: &[ColumnDefinition], rows: &[Product]) -> Result<Self, PricingError> {
        let mut values = BTreeMap::new();

        for column in columns
            .iter()
            .filter(|c| c.aggregation != AggregationStrategy::None)
        {
            values.insert(column.id.clone(), aggregate(column, rows)?);
        }

        tracing::debug!(rows = rows.len(), aggregated = values.len(), "computed aggregates");
        Ok(Aggregates { values })
    }

    pub fn get(&self, id: &ColumnId) -> Option<f64> {
        self.values.get(id).copied()
    }

    /// 0 when the column is absent from the schema
    pub fn get_or_zero(&self, id: &ColumnId) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    pub fn total_variable_costs(&self) -> f64 {
        self.get_or_zero(&ColumnId::total_variable_costs())
    }

    pub fn estimated_hours_total(&self) -> f64 {
        self.get_or_zero(&ColumnId::estimated_hours())
    }

    pub fn cost_basis(&self) -> CostBasis {
        CostBasis::new(self.total_variable_costs(), self.estimated_hours_total())
    }

    /// Footer of a contribution column: `contribution` divided by the
    /// aggregate of the column's divisor, or the contribution itself when it
    /// has none. `None` when the divisor totals 0 or `column` is not a
    /// contribution column.
    pub fn contribution_footer(&self, column: &ColumnDefinition, contribution: f64) -> Option<f64> {
        if !column.is_contribution() {
            return None;
        }
        match &column.meta.contribution_divisor {
            Some(divisor) => ratio(contribution, self.get_or_zero(divisor)),
            None => contribution.is_finite().then_some(contribution),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnId, f64)> {
        self.values.iter().map(|(id, value)| (id, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
