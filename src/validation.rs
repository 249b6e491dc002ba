// 📐 Shape Layer - Quote Validation
// Collects every structural problem in a quote instead of stopping at the first

use crate::quote::{Product, Quote};
use std::collections::HashSet;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Product name, or "Quote" for quote-level issues
    pub product: String,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(product: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            product: product.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.product, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// QUOTE VALIDATOR
// ============================================================================

pub struct QuoteValidator;

impl QuoteValidator {
    pub fn new() -> Self {
        QuoteValidator
    }

    /// Validate one product
    pub fn validate_product(&self, product: &Product) -> ValidationResult {
        let mut errors = Vec::new();
        let label = product_label(product);

        if product.name.trim().is_empty() {
            errors.push(ValidationError::new(&label, "name", "Required field is empty"));
        }

        if !product.estimated_hours.is_finite() {
            errors.push(ValidationError::new(&label, "estimated_hours", "Must be a finite number"));
        } else if product.estimated_hours < 0.0 {
            errors.push(ValidationError::new(
                &label,
                "estimated_hours",
                format!("Must not be negative, got {}", product.estimated_hours),
            ));
        }

        if !product.quantity.is_finite() || product.quantity < 0.0 {
            errors.push(ValidationError::new(
                &label,
                "quantity",
                format!("Must be a non-negative number, got {}", product.quantity),
            ));
        }

        let mut seen = HashSet::new();
        for cost in &product.costs {
            if cost.name.trim().is_empty() {
                errors.push(ValidationError::new(&label, "costs", "Cost name is empty"));
            }
            if !seen.insert(cost.name.as_str()) {
                errors.push(ValidationError::new(
                    &label,
                    format!("costs.{}", cost.name),
                    "Duplicate cost name",
                ));
            }
            // Negative values are credits and allowed
            if !cost.value.is_finite() {
                errors.push(ValidationError::new(
                    &label,
                    format!("costs.{}", cost.name),
                    "Must be a finite number",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate every product, plus quote-level invariants
    pub fn validate_quote(&self, quote: &Quote) -> ValidationResult {
        let mut errors = Vec::new();

        let mut ids = HashSet::new();
        for product in quote.products() {
            if let Err(mut product_errors) = self.validate_product(product) {
                errors.append(&mut product_errors);
            }
            if !product.id.is_empty() && !ids.insert(product.id.as_str()) {
                errors.push(ValidationError::new(
                    "Quote",
                    "products.id",
                    format!("Duplicate product id {}", product.id),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn product_label(product: &Product) -> String {
    if product.name.trim().is_empty() {
        format!("product {}", product.id)
    } else {
        product.name.clone()
    }
}

// ============================================================================
// TESTS
// ============================================================================
