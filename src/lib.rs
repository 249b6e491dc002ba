// Quote Pricing - Core Library
// Contribution-margin pricing for quotes with dynamically named cost lines

pub mod error;
pub mod quote;
pub mod validation;     // Shape Layer - structural quote checks
pub mod columns;        // Column schema: static, dynamic, computed
pub mod aggregate;      // Column summaries
pub mod scenario;       // Target margin / manual / per-item pricing
pub mod format;         // Currency and percent display contract
pub mod totals;         // Three-scenario totals sheet
pub mod cache;          // Content-hash keyed derivation cache
pub mod config;
pub mod import;         // Quote loading from JSON and CSV
pub mod engine;

// Re-export commonly used types
pub use error::PricingError;
pub use quote::{Cost, Product, Quote};
pub use validation::{QuoteValidator, ValidationError, ValidationResult};
pub use columns::{
    ColumnDefinition, ColumnId, ColumnKind, ColumnMeta, ComputedField, StaticField,
    contribution_columns, derive_columns, derive_dynamic_columns, distinct_cost_names,
};
pub use aggregate::{
    AggregationStrategy, Aggregates,
    aggregate, aggregate_by_id, aggregation_fn,
};
pub use scenario::{
    CostBasis, ManualPrice, PricePerItem, PricingStrategy, ScenarioCalculator,
    ScenarioInputs, ScenarioKind, ScenarioOutcome, ScenarioRecord, ScenarioResult,
    ScenarioResultSet, TargetMargin,
    compute_scenarios, evaluate_scenario,
};
pub use format::{FormatOptions, NumberLocale, ValueFormat, format_value, get_locale};
pub use totals::{contribution_footers, TotalsRow, TotalsSheet};
pub use cache::{Derivation, PricingCache};
pub use config::PricingConfig;
pub use import::{load_quote, load_quote_csv, load_quote_json};
pub use engine::{PricingEngine, PricingReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
