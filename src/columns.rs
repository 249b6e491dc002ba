// 🏛️ Column Model - Static, dynamic and computed columns of the pricing table
// Dynamic columns are derived from the quote on every call, never cached here

use crate::aggregate::AggregationStrategy;
use crate::format::{format_value, FormatOptions, ValueFormat};
use crate::quote::{Product, Quote};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// COLUMN ID
// ============================================================================

/// Stable column identifier, e.g. `estimated_hours` or `dynamic-cost-shipping`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(String);

impl ColumnId {
    pub const DYNAMIC_COST_PREFIX: &'static str = "dynamic-cost-";

    pub fn new(id: impl Into<String>) -> Self {
        ColumnId(id.into())
    }

    pub fn name() -> Self {
        ColumnId::new("name")
    }

    pub fn quantity() -> Self {
        ColumnId::new("quantity")
    }

    pub fn estimated_hours() -> Self {
        ColumnId::new("estimated_hours")
    }

    pub fn total_variable_costs() -> Self {
        ColumnId::new("totalVariableCosts")
    }

    pub fn contribution_dollars() -> Self {
        ColumnId::new("contributionDollars")
    }

    pub fn contribution_per_hour() -> Self {
        ColumnId::new("contributionPerHour")
    }

    pub fn contribution_per_unit() -> Self {
        ColumnId::new("contributionPerUnit")
    }

    pub fn dynamic_cost(cost_name: &str) -> Self {
        ColumnId(format!("{}{}", Self::DYNAMIC_COST_PREFIX, cost_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cost name for a dynamic cost column id
    pub fn cost_name(&self) -> Option<&str> {
        self.0.strip_prefix(Self::DYNAMIC_COST_PREFIX)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// COLUMN KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaticField {
    Name,
    Quantity,
    EstimatedHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputedField {
    /// Sum of every variable cost on the row
    TotalVariableCosts,
    /// Scenario contribution, optionally divided by another column's total.
    /// Only the footer is defined; row cells are undefined.
    Contribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Same for every quote
    Static(StaticField),
    /// One per distinct cost name in the current quote
    Dynamic { cost_name: String },
    /// Derived from other columns of the same row
    Computed(ComputedField),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Set for dynamic cost columns
    pub cost_name: Option<String>,

    /// Cells accept user edits
    pub editable: bool,

    /// Counts towards total variable costs
    pub variable_cost: bool,

    /// Contribution columns: the column whose aggregate the footer divides
    /// the contribution by. `None` shows the contribution itself.
    pub contribution_divisor: Option<ColumnId>,
}

// ============================================================================
// COLUMN DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub id: ColumnId,
    pub label: String,
    pub kind: ColumnKind,
    pub aggregation: AggregationStrategy,
    pub format: ValueFormat,
    pub meta: ColumnMeta,
}

impl ColumnDefinition {
    pub fn new(id: ColumnId, label: impl Into<String>, kind: ColumnKind) -> Self {
        ColumnDefinition {
            id,
            label: label.into(),
            kind,
            aggregation: AggregationStrategy::None,
            format: ValueFormat::Number,
            meta: ColumnMeta::default(),
        }
    }

    /// Builder: set aggregation strategy
    pub fn with_aggregation(mut self, aggregation: AggregationStrategy) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Builder: set display format
    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder: mark cells as editable
    pub fn editable(mut self) -> Self {
        self.meta.editable = true;
        self
    }

    /// Builder: mark as a variable cost column
    pub fn variable_cost(mut self) -> Self {
        self.meta.variable_cost = true;
        self
    }

    /// Builder: divide the contribution footer by `divisor`'s aggregate
    pub fn contribution_divisor(mut self, divisor: ColumnId) -> Self {
        self.meta.contribution_divisor = Some(divisor);
        self
    }

    /// Numeric value of this column for one product; `None` means undefined
    pub fn value(&self, product: &Product) -> Option<f64> {
        match &self.kind {
            ColumnKind::Static(StaticField::Name) => None,
            ColumnKind::Static(StaticField::Quantity) => Some(product.quantity),
            ColumnKind::Static(StaticField::EstimatedHours) => Some(product.estimated_hours),
            ColumnKind::Dynamic { cost_name } => product.cost(cost_name),
            ColumnKind::Computed(ComputedField::TotalVariableCosts) => Some(product.total_costs()),
            ColumnKind::Computed(ComputedField::Contribution) => None,
        }
    }

    /// Cell text for one product
    pub fn display(&self, product: &Product, options: &FormatOptions) -> String {
        match &self.kind {
            ColumnKind::Static(StaticField::Name) => product.name.clone(),
            _ => format_value(self.value(product), self.format, options),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, ColumnKind::Dynamic { .. })
    }

    pub fn is_contribution(&self) -> bool {
        matches!(self.kind, ColumnKind::Computed(ComputedField::Contribution))
    }
}

// ============================================================================
// SCHEMA DERIVATION
// ============================================================================

/// Distinct cost names across all products, in first-seen order
pub fn distinct_cost_names(products: &[Product]) -> Vec<String> {
    let mut seen = HashSet::new();
    products
        .iter()
        .flat_map(|product| product.costs.iter())
        .filter(|cost| seen.insert(cost.name.as_str()))
        .map(|cost| cost.name.clone())
        .collect()
}

/// One dynamic cost column per distinct cost name
pub fn derive_dynamic_columns(products: &[Product]) -> Vec<ColumnDefinition> {
    distinct_cost_names(products)
        .into_iter()
        .map(|name| {
            let mut column = ColumnDefinition::new(
                ColumnId::dynamic_cost(&name),
                name.clone(),
                ColumnKind::Dynamic {
                    cost_name: name.clone(),
                },
            )
            .with_aggregation(AggregationStrategy::Sum)
            .with_format(ValueFormat::Currency)
            .editable()
            .variable_cost();
            column.meta.cost_name = Some(name);
            column
        })
        .collect()
}

pub fn static_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new(ColumnId::name(), "Product", ColumnKind::Static(StaticField::Name))
            .with_format(ValueFormat::Text)
            .editable(),
        ColumnDefinition::new(
            ColumnId::quantity(),
            "Quantity",
            ColumnKind::Static(StaticField::Quantity),
        )
        .with_aggregation(AggregationStrategy::Sum)
        .editable(),
    ]
}

pub fn computed_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new(
            ColumnId::total_variable_costs(),
            "Total variable costs",
            ColumnKind::Computed(ComputedField::TotalVariableCosts),
        )
        .with_aggregation(AggregationStrategy::Sum)
        .with_format(ValueFormat::Currency),
    ]
}

pub fn estimated_hours_column() -> ColumnDefinition {
    ColumnDefinition::new(
        ColumnId::estimated_hours(),
        "Estimated hours",
        ColumnKind::Static(StaticField::EstimatedHours),
    )
    .with_aggregation(AggregationStrategy::Sum)
    .editable()
}

/// Contribution in dollars, per estimated hour and per unit. No aggregation
/// strategy: the footer comes from `Aggregates::contribution_footer`.
pub fn contribution_columns() -> Vec<ColumnDefinition> {
    let contribution = |id: ColumnId, label: &str| {
        ColumnDefinition::new(id, label, ColumnKind::Computed(ComputedField::Contribution))
            .with_format(ValueFormat::Currency)
    };

    vec![
        contribution(ColumnId::contribution_dollars(), "Contribution"),
        contribution(ColumnId::contribution_per_hour(), "Contribution / hour")
            .contribution_divisor(ColumnId::estimated_hours()),
        contribution(ColumnId::contribution_per_unit(), "Contribution / unit")
            .contribution_divisor(ColumnId::quantity()),
    ]
}

/// Full column set for a quote in table order: static, dynamic (first-seen
/// order), computed, estimated hours, contribution
pub fn derive_columns(quote: &Quote) -> Vec<ColumnDefinition> {
    let dynamic = derive_dynamic_columns(quote.products());

    let mut columns = static_columns();
    columns.extend(dynamic);
    columns.extend(computed_columns());
    columns.push(estimated_hours_column());
    columns.extend(contribution_columns());

    tracing::debug!(
        products = quote.len(),
        columns = columns.len(),
        "derived column schema"
    );
    columns
}

pub fn find_column<'a>(columns: &'a [ColumnDefinition], id: &ColumnId) -> Option<&'a ColumnDefinition> {
    columns.iter().find(|column| &column.id == id)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product_with_costs(name: &str, costs: &[&str]) -> Product {
        costs
            .iter()
            .fold(Product::new(name), |p, cost| p.with_cost(*cost, 1.0))
    }

    #[test]
    fn test_distinct_cost_names_first_seen_order() {
        let products = vec![
            product_with_costs("P1", &["A", "B"]),
            product_with_costs("P2", &["B", "C"]),
            product_with_costs("P3", &["A", "D"]),
        ];

        assert_eq!(distinct_cost_names(&products), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_order_stable_when_first_occurrences_unchanged() {
        let products = vec![
            product_with_costs("P1", &["A", "B"]),
            product_with_costs("P2", &["B", "C"]),
            product_with_costs("P3", &["A", "D"]),
        ];
        // Swap the later products; first occurrences of C and D keep their relative order
        let reordered = vec![
            products[0].clone(),
            product_with_costs("P2b", &["C"]),
            products[2].clone(),
            products[1].clone(),
        ];

        assert_eq!(
            distinct_cost_names(&products),
            distinct_cost_names(&reordered)
        );
    }

    #[test]
    fn test_dynamic_column_ids_and_labels() {
        let products = vec![product_with_costs("P1", &["shipping", "packaging"])];
        let columns = derive_dynamic_columns(&products);

        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].id, ColumnId::dynamic_cost("shipping"));
        assert_eq!(columns[0].id.as_str(), "dynamic-cost-shipping");
        assert_eq!(columns[0].label, "shipping");
        assert_eq!(columns[0].meta.cost_name.as_deref(), Some("shipping"));
        assert_eq!(columns[0].aggregation, AggregationStrategy::Sum);
        assert!(columns[0].meta.variable_cost);
    }

    #[test]
    fn test_dynamic_accessor_missing_cost_is_undefined() {
        let products = vec![
            product_with_costs("P1", &["shipping"]),
            product_with_costs("P2", &["packaging"]),
        ];
        let columns = derive_dynamic_columns(&products);

        assert_eq!(columns[0].value(&products[0]), Some(1.0));
        assert_eq!(columns[0].value(&products[1]), None);
    }

    #[test]
    fn test_derive_columns_layout() {
        let quote = Quote::from_products(vec![product_with_costs("P1", &["shipping"])]);
        let ids: Vec<String> = derive_columns(&quote)
            .iter()
            .map(|c| c.id.to_string())
            .collect();

        assert_eq!(
            ids,
            vec![
                "name",
                "quantity",
                "dynamic-cost-shipping",
                "totalVariableCosts",
                "estimated_hours",
                "contributionDollars",
                "contributionPerHour",
                "contributionPerUnit"
            ]
        );
    }

    #[test]
    fn test_derive_columns_empty_quote() {
        let columns = derive_columns(&Quote::new());

        assert!(columns.iter().all(|c| !c.is_dynamic()));
        assert_eq!(columns.len(), 7);
    }

    #[test]
    fn test_schema_follows_edits() {
        let quote = Quote::from_products(vec![product_with_costs("P1", &["shipping"])]);
        let edited = quote.with_cost_value(0, "insurance", 2.0).unwrap();

        assert_eq!(derive_dynamic_columns(quote.products()).len(), 1);
        assert_eq!(derive_dynamic_columns(edited.products()).len(), 2);
    }

    #[test]
    fn test_total_variable_costs_accessor() {
        let product = Product::new("P1")
            .with_cost("shipping", 10.0)
            .with_cost("credit", -2.5);
        let columns = computed_columns();

        assert_eq!(columns[0].value(&product), Some(7.5));
    }

    #[test]
    fn test_name_column_display() {
        let product = Product::new("Widget").with_hours(2.0);
        let columns = derive_columns(&Quote::from_products(vec![product.clone()]));
        let options = FormatOptions::default();

        assert_eq!(columns[0].value(&product), None);
        assert_eq!(columns[0].display(&product, &options), "Widget");
    }

    #[test]
    fn test_contribution_columns_meta() {
        let columns = contribution_columns();
        let product = Product::new("P1").with_hours(2.0);

        assert!(columns.iter().all(|c| c.is_contribution()));
        assert!(columns.iter().all(|c| c.aggregation == AggregationStrategy::None));
        assert_eq!(columns[0].meta.contribution_divisor, None);
        assert_eq!(columns[1].meta.contribution_divisor, Some(ColumnId::estimated_hours()));
        assert_eq!(columns[2].meta.contribution_divisor, Some(ColumnId::quantity()));
        assert_eq!(columns[1].value(&product), None);
    }

    #[test]
    fn test_column_id_cost_name() {
        assert_eq!(ColumnId::dynamic_cost("shipping").cost_name(), Some("shipping"));
        assert_eq!(ColumnId::estimated_hours().cost_name(), None);
    }

    fn arb_products() -> impl Strategy<Value = Vec<Product>> {
        prop::collection::vec(
            prop::collection::vec(("[a-f]", -100.0f64..100.0), 0..5),
            0..6,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, costs)| {
                    costs.into_iter().fold(Product::new(format!("P{}", i)), |p, (name, value)| {
                        p.with_cost(name, value)
                    })
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_cost_names_unique_and_first_seen(products in arb_products()) {
            let names = distinct_cost_names(&products);

            let mut expected: Vec<String> = Vec::new();
            for cost in products.iter().flat_map(|p| p.costs.iter()) {
                if !expected.contains(&cost.name) {
                    expected.push(cost.name.clone());
                }
            }
            prop_assert_eq!(names, expected);
        }

        #[test]
        fn prop_derive_columns_deterministic(products in arb_products()) {
            let quote = Quote::from_products(products);
            prop_assert_eq!(derive_columns(&quote), derive_columns(&quote));
        }
    }
}
