// 🗃️ Derivation Cache - Columns and aggregates keyed by quote content hash
// Any content change changes the key, so a stale schema is never served.
// Used through `PricingEngine::price_cached` by hosts that reprice on every edit.

use crate::aggregate::Aggregates;
use crate::columns::{derive_columns, ColumnDefinition};
use crate::error::PricingError;
use crate::quote::Quote;
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub quote_hash: String,
    pub columns: Vec<ColumnDefinition>,
    pub aggregates: Aggregates,
}

impl Derivation {
    pub fn compute(quote: &Quote) -> Result<Self, PricingError> {
        quote.check_cost_names()?;
        let columns = derive_columns(quote);
        let aggregates = Aggregates::compute(&columns, quote.products())?;
        Ok(Derivation {
            quote_hash: quote.content_hash(),
            columns,
            aggregates,
        })
    }
}

pub struct PricingCache {
    capacity: usize,
    entries: HashMap<String, Derivation>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl PricingCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PricingCache {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached derivation for this exact quote content, computing it on a miss.
    /// Failed derivations are not cached.
    pub fn get_or_derive(&mut self, quote: &Quote) -> Result<&Derivation, PricingError> {
        let key = quote.content_hash();

        if self.entries.contains_key(&key) {
            self.hits += 1;
            tracing::trace!(hash = %key, "derivation cache hit");
        } else {
            self.misses += 1;
            tracing::trace!(hash = %key, "derivation cache miss");

            let derivation = Derivation::compute(quote)?;
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.order.push_back(key.clone());
            self.entries.insert(key.clone(), derivation);
        }

        Ok(&self.entries[&key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for PricingCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
