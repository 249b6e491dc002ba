// ⚙️ Pricing Configuration - Business constants and display settings as data

use crate::format::{get_locale, FormatOptions};
use crate::scenario::DEFAULT_CREDIT_CARD_FEE_PERCENT;
use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Card processing fee, percent of a scenario's selling price
    pub credit_card_fee_percent: f64,

    /// Number locale id (e.g. "en-US", "de-DE")
    pub locale: String,

    pub currency_symbol: String,

    /// Fraction digits shown for percentages
    pub percent_decimals: usize,

    /// Shown in place of values that are not applicable
    pub not_applicable: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            credit_card_fee_percent: DEFAULT_CREDIT_CARD_FEE_PERCENT,
            locale: "en-US".to_string(),
            currency_symbol: "$".to_string(),
            percent_decimals: 0,
            not_applicable: "N/A".to_string(),
        }
    }
}

impl PricingConfig {
    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: PricingConfig =
            serde_json::from_str(content).context("Failed to parse pricing config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.credit_card_fee_percent.is_finite()
            || self.credit_card_fee_percent < 0.0
            || self.credit_card_fee_percent >= 100.0
        {
            bail!(
                "credit_card_fee_percent must be in [0, 100), got {}",
                self.credit_card_fee_percent
            );
        }
        if get_locale(&self.locale).is_none() {
            bail!("Unsupported locale: {}", self.locale);
        }
        Ok(())
    }

    pub fn format_options(&self) -> Result<FormatOptions> {
        let locale = get_locale(&self.locale)
            .ok_or_else(|| anyhow!("Unsupported locale: {}", self.locale))?;

        Ok(FormatOptions {
            locale: *locale,
            currency_symbol: self.currency_symbol.clone(),
            percent_decimals: self.percent_decimals,
            not_applicable: self.not_applicable.clone(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DE_DE;

    #[test]
    fn test_default_config_is_valid() {
        let config = PricingConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.credit_card_fee_percent, 3.0);
        assert_eq!(config.format_options().unwrap(), FormatOptions::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PricingConfig::from_json_str(r#"{"locale": "de-DE", "currency_symbol": "€"}"#)
            .unwrap();

        assert_eq!(config.credit_card_fee_percent, 3.0);
        assert_eq!(config.not_applicable, "N/A");
        assert_eq!(config.format_options().unwrap().locale, DE_DE);
    }

    #[test]
    fn test_rejects_fee_out_of_range() {
        assert!(PricingConfig::from_json_str(r#"{"credit_card_fee_percent": 100}"#).is_err());
        assert!(PricingConfig::from_json_str(r#"{"credit_card_fee_percent": -1}"#).is_err());
    }

    #[test]
    fn test_rejects_unknown_locale() {
        let err = PricingConfig::from_json_str(r#"{"locale": "tlh"}"#).unwrap_err();
        assert!(err.to_string().contains("Unsupported locale"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = PricingConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = PricingConfig::from_file("/nonexistent/pricing.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
