// 📊 Totals Sheet - The three pricing scenarios side by side
// Rows shared by all scenarios repeat the same aggregate in every column

use crate::aggregate::Aggregates;
use crate::columns::ColumnDefinition;
use crate::format::{format_value, FormatOptions, ValueFormat};
use crate::scenario::{ScenarioKind, ScenarioResult, ScenarioResultSet};
use serde::{Deserialize, Serialize};

pub const SELLING_PRICE: &str = "Selling price";
pub const CREDIT_CARD_FEE: &str = "Credit card fee";
pub const TOTAL_VARIABLE_COSTS: &str = "Total variable costs";
pub const ESTIMATED_HOURS: &str = "Estimated hours";
pub const CONTRIBUTION: &str = "Contribution";
pub const CONTRIBUTION_MARGIN: &str = "Contribution margin";
pub const CONTRIBUTION_PER_HOUR: &str = "Contribution per hour";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsRow {
    pub label: String,
    pub format: ValueFormat,
    /// One value per scenario, in `ScenarioKind::ALL` order
    pub values: [Option<f64>; 3],
}

impl TotalsRow {
    fn uniform(label: impl Into<String>, format: ValueFormat, value: Option<f64>) -> Self {
        TotalsRow {
            label: label.into(),
            format,
            values: [value; 3],
        }
    }

    fn per_scenario<F>(label: &str, format: ValueFormat, scenarios: &ScenarioResultSet, metric: F) -> Self
    where
        F: Fn(&ScenarioResult) -> Option<f64>,
    {
        let values = ScenarioKind::ALL.map(|kind| scenarios.get(kind).as_ref().ok().and_then(&metric));
        TotalsRow {
            label: label.to_string(),
            format,
            values,
        }
    }

    pub fn formatted(&self, options: &FormatOptions) -> [String; 3] {
        self.values
            .map(|value| format_value(value, self.format, options))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsSheet {
    pub headers: [String; 3],
    pub rows: Vec<TotalsRow>,
}

impl TotalsSheet {
    pub fn build(
        columns: &[ColumnDefinition],
        aggregates: &Aggregates,
        scenarios: &ScenarioResultSet,
    ) -> Self {
        let mut rows = vec![TotalsRow::per_scenario(
            SELLING_PRICE,
            ValueFormat::Currency,
            scenarios,
            |r| Some(r.selling_price),
        )];

        for column in columns.iter().filter(|c| c.is_dynamic()) {
            rows.push(TotalsRow::uniform(
                column.label.clone(),
                column.format,
                aggregates.get(&column.id),
            ));
        }

        rows.push(TotalsRow::per_scenario(
            CREDIT_CARD_FEE,
            ValueFormat::Currency,
            scenarios,
            |r| Some(r.credit_card_fee),
        ));
        rows.push(TotalsRow::uniform(
            TOTAL_VARIABLE_COSTS,
            ValueFormat::Currency,
            Some(aggregates.total_variable_costs()),
        ));
        rows.push(TotalsRow::uniform(
            ESTIMATED_HOURS,
            ValueFormat::Number,
            Some(aggregates.estimated_hours_total()),
        ));
        rows.push(TotalsRow::per_scenario(
            CONTRIBUTION,
            ValueFormat::Currency,
            scenarios,
            |r| Some(r.contribution_dollars),
        ));
        rows.push(TotalsRow::per_scenario(
            CONTRIBUTION_MARGIN,
            ValueFormat::Percent,
            scenarios,
            |r| r.contribution_percent,
        ));
        rows.push(TotalsRow::per_scenario(
            CONTRIBUTION_PER_HOUR,
            ValueFormat::Currency,
            scenarios,
            |r| r.contribution_per_hour,
        ));

        TotalsSheet {
            headers: ScenarioKind::ALL.map(|kind| kind.label().to_string()),
            rows,
        }
    }

    pub fn row(&self, label: &str) -> Option<&TotalsRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    /// Every row as display text
    pub fn render(&self, options: &FormatOptions) -> Vec<(String, [String; 3])> {
        self.rows
            .iter()
            .map(|row| (row.label.clone(), row.formatted(options)))
            .collect()
    }
}

/// Footer of every contribution column, one value per scenario: that
/// scenario's contribution over the divisor column's aggregate
pub fn contribution_footers(
    columns: &[ColumnDefinition],
    aggregates: &Aggregates,
    scenarios: &ScenarioResultSet,
) -> Vec<TotalsRow> {
    columns
        .iter()
        .filter(|c| c.is_contribution())
        .map(|column| {
            TotalsRow::per_scenario(&column.label, column.format, scenarios, |r| {
                aggregates.contribution_footer(column, r.contribution_dollars)
            })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
