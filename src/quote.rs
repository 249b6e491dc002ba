// 🧾 Quote Model - Products and their named costs
// A Quote is a value: every edit returns a new Quote, the old snapshot stays intact

use crate::error::PricingError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

// ============================================================================
// COST
// ============================================================================

/// A named cost attached to one product. Negative values are credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub name: String,
    pub value: f64,
}

impl Cost {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Cost {
            name: name.into(),
            value,
        }
    }
}

// ============================================================================
// PRODUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identity (UUID v4), assigned on creation or on load
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default = "default_quantity")]
    pub quantity: f64,

    #[serde(default)]
    pub estimated_hours: f64,

    /// Cost names are unique within one product
    #[serde(default)]
    pub costs: Vec<Cost>,
}

fn default_quantity() -> f64 {
    1.0
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            quantity: default_quantity(),
            estimated_hours: 0.0,
            costs: Vec::new(),
        }
    }

    /// Builder: set estimated hours
    pub fn with_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }

    /// Builder: set quantity
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder: set a cost, replacing any existing cost of the same name
    pub fn with_cost(mut self, name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        match self.costs.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.value = value,
            None => self.costs.push(Cost::new(name, value)),
        }
        self
    }

    /// Value of the named cost, `None` when this product has no such cost
    pub fn cost(&self, name: &str) -> Option<f64> {
        self.costs.iter().find(|c| c.name == name).map(|c| c.value)
    }

    pub fn has_cost(&self, name: &str) -> bool {
        self.costs.iter().any(|c| c.name == name)
    }

    /// Sum of this product's costs, one value per cost name (the same value
    /// `cost(name)` reports)
    pub fn total_costs(&self) -> f64 {
        let mut seen = HashSet::new();
        self.costs
            .iter()
            .filter(|c| seen.insert(c.name.as_str()))
            .map(|c| c.value)
            .sum()
    }

    /// Assign an id if the product was loaded without one
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
    }
}

// ============================================================================
// QUOTE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    products: Vec<Product>,
}

impl Quote {
    pub fn new() -> Self {
        Quote::default()
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        let mut quote = Quote { products };
        for product in &mut quote.products {
            product.ensure_id();
        }
        quote
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Cost names are unique within each product. The first duplicate found
    /// is reported.
    pub fn check_cost_names(&self) -> Result<(), PricingError> {
        for product in &self.products {
            let mut seen = HashSet::new();
            if let Some(duplicate) = product.costs.iter().find(|c| !seen.insert(c.name.as_str())) {
                return Err(PricingError::DuplicateCostName {
                    product: product.name.clone(),
                    name: duplicate.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn product(&self, index: usize) -> Result<&Product, PricingError> {
        self.products
            .get(index)
            .ok_or(PricingError::ProductIndexOutOfRange {
                index,
                len: self.products.len(),
            })
    }

    // ========================================================================
    // COPY-ON-WRITE EDITS
    // ========================================================================

    /// New quote with `product` appended
    pub fn with_product(&self, mut product: Product) -> Quote {
        product.ensure_id();
        let mut products = self.products.clone();
        products.push(product);
        Quote { products }
    }

    pub fn without_product(&self, index: usize) -> Result<Quote, PricingError> {
        self.product(index)?;
        let mut products = self.products.clone();
        products.remove(index);
        Ok(Quote { products })
    }

    /// Set (or insert) a named cost on one product
    pub fn with_cost_value(
        &self,
        index: usize,
        name: &str,
        value: f64,
    ) -> Result<Quote, PricingError> {
        check_finite(value, name)?;
        self.edit_product(index, |product| {
            *product = product.clone().with_cost(name, value);
            Ok(())
        })
    }

    /// Add a cost called `name` to every product that does not have one yet
    pub fn with_cost_column(&self, name: &str, default_value: f64) -> Result<Quote, PricingError> {
        check_finite(default_value, name)?;
        let products = self
            .products
            .iter()
            .map(|product| {
                let mut product = product.clone();
                if !product.has_cost(name) {
                    product.costs.push(Cost::new(name, default_value));
                }
                product
            })
            .collect();
        Ok(Quote { products })
    }

    /// Remove the named cost from every product
    pub fn without_cost_column(&self, name: &str) -> Result<Quote, PricingError> {
        if !self.products.iter().any(|p| p.has_cost(name)) {
            return Err(PricingError::UnknownCostName {
                name: name.to_string(),
            });
        }

        let products = self
            .products
            .iter()
            .map(|product| {
                let mut product = product.clone();
                product.costs.retain(|c| c.name != name);
                product
            })
            .collect();
        Ok(Quote { products })
    }

    /// Rename a cost across all products, keeping each cost's position
    pub fn rename_cost_column(&self, old: &str, new: &str) -> Result<Quote, PricingError> {
        if !self.products.iter().any(|p| p.has_cost(old)) {
            return Err(PricingError::UnknownCostName {
                name: old.to_string(),
            });
        }
        if old == new {
            return Ok(self.clone());
        }

        let mut products = Vec::with_capacity(self.products.len());
        for product in &self.products {
            if product.has_cost(old) && product.has_cost(new) {
                return Err(PricingError::DuplicateCostName {
                    product: product.name.clone(),
                    name: new.to_string(),
                });
            }
            let mut product = product.clone();
            for cost in product.costs.iter_mut().filter(|c| c.name == old) {
                cost.name = new.to_string();
            }
            products.push(product);
        }
        Ok(Quote { products })
    }

    pub fn with_estimated_hours(&self, index: usize, hours: f64) -> Result<Quote, PricingError> {
        check_finite(hours, "estimated_hours")?;
        self.edit_product(index, |product| {
            if hours < 0.0 {
                return Err(PricingError::NegativeEstimatedHours {
                    product: product.name.clone(),
                    hours,
                });
            }
            product.estimated_hours = hours;
            Ok(())
        })
    }

    pub fn with_product_name(&self, index: usize, name: &str) -> Result<Quote, PricingError> {
        self.edit_product(index, |product| {
            product.name = name.to_string();
            Ok(())
        })
    }

    fn edit_product<F>(&self, index: usize, edit: F) -> Result<Quote, PricingError>
    where
        F: FnOnce(&mut Product) -> Result<(), PricingError>,
    {
        self.product(index)?;
        let mut products = self.products.clone();
        edit(&mut products[index])?;
        Ok(Quote { products })
    }

    // ========================================================================
    // CONTENT HASH
    // ========================================================================

    /// SHA-256 over a length-prefixed binary encoding of every field that
    /// affects pricing (ids, names, and the IEEE-754 bits of each number),
    /// hex encoded. Equal content always yields an equal hash; the encoding
    /// does not depend on the serde representation.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.products.len() as u64).to_le_bytes());

        for product in &self.products {
            hash_str(&mut hasher, &product.id);
            hash_str(&mut hasher, &product.name);
            hasher.update(product.quantity.to_bits().to_le_bytes());
            hasher.update(product.estimated_hours.to_bits().to_le_bytes());
            hasher.update((product.costs.len() as u64).to_le_bytes());
            for cost in &product.costs {
                hash_str(&mut hasher, &cost.name);
                hasher.update(cost.value.to_bits().to_le_bytes());
            }
        }

        format!("{:x}", hasher.finalize())
    }
}

// Length prefix keeps ("ab", "c") and ("a", "bc") apart
fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn check_finite(value: f64, field: &str) -> Result<(), PricingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PricingError::NonFiniteValue {
            field: field.to_string(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
