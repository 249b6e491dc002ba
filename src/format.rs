// 🔢 Number Formatting - Currency, percent and plain numbers for display
// Undefined, NaN and infinite values always render as the not-applicable marker

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Text,
    Number,
    Currency,
    Percent,
}

// ============================================================================
// LOCALES
// ============================================================================

/// Separators and symbol placement for one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub id: &'static str,
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
    /// `1.234,50 €` instead of `$1,234.50`
    pub currency_suffix: bool,
    /// `20 %` instead of `20%`
    pub percent_space: bool,
}

pub static EN_US: NumberLocale = NumberLocale {
    id: "en-US",
    decimal_separator: '.',
    thousands_separator: Some(','),
    currency_suffix: false,
    percent_space: false,
};

pub static EN_GB: NumberLocale = NumberLocale {
    id: "en-GB",
    decimal_separator: '.',
    thousands_separator: Some(','),
    currency_suffix: false,
    percent_space: false,
};

pub static DE_DE: NumberLocale = NumberLocale {
    id: "de-DE",
    decimal_separator: ',',
    thousands_separator: Some('.'),
    currency_suffix: true,
    percent_space: true,
};

/// French groups thousands with U+00A0 NO-BREAK SPACE.
pub static FR_FR: NumberLocale = NumberLocale {
    id: "fr-FR",
    decimal_separator: ',',
    thousands_separator: Some('\u{a0}'),
    currency_suffix: true,
    percent_space: true,
};

pub static ES_ES: NumberLocale = NumberLocale {
    id: "es-ES",
    decimal_separator: ',',
    thousands_separator: Some('.'),
    currency_suffix: true,
    percent_space: true,
};

static LOCALES: [&NumberLocale; 5] = [&EN_US, &EN_GB, &DE_DE, &FR_FR, &ES_ES];

/// Case-insensitive lookup, accepts `_` in place of `-`
pub fn get_locale(id: &str) -> Option<&'static NumberLocale> {
    let normalized = id.trim().replace('_', "-");
    LOCALES
        .iter()
        .copied()
        .find(|locale| locale.id.eq_ignore_ascii_case(&normalized))
}

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub locale: NumberLocale,
    pub currency_symbol: String,
    pub percent_decimals: usize,
    pub not_applicable: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            locale: EN_US,
            currency_symbol: "$".to_string(),
            percent_decimals: 0,
            not_applicable: "N/A".to_string(),
        }
    }
}

impl FormatOptions {
    pub fn with_locale(mut self, locale: NumberLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

pub fn format_value(value: Option<f64>, format: ValueFormat, options: &FormatOptions) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return options.not_applicable.clone();
    };

    match format {
        ValueFormat::Currency => format_currency(value, options),
        ValueFormat::Percent => format_percent(value, options),
        ValueFormat::Number | ValueFormat::Text => format_number(value, options),
    }
}

fn format_currency(value: f64, options: &FormatOptions) -> String {
    let raw = format!("{:.2}", value.abs());
    let sign = sign_for(value, &raw);
    let body = localize(&raw, &options.locale);

    if options.locale.currency_suffix {
        format!("{}{}\u{a0}{}", sign, body, options.currency_symbol)
    } else {
        format!("{}{}{}", sign, options.currency_symbol, body)
    }
}

fn format_percent(value: f64, options: &FormatOptions) -> String {
    let raw = format!("{:.*}", options.percent_decimals, value.abs() * 100.0);
    let sign = sign_for(value, &raw);
    let body = localize(&raw, &options.locale);

    if options.locale.percent_space {
        format!("{}{}\u{a0}%", sign, body)
    } else {
        format!("{}{}%", sign, body)
    }
}

/// Up to two decimals, trailing zeros dropped
fn format_number(value: f64, options: &FormatOptions) -> String {
    let mut raw = format!("{:.2}", value.abs());
    if raw.contains('.') {
        let trimmed = raw.trim_end_matches('0').trim_end_matches('.').len();
        raw.truncate(trimmed);
    }
    let sign = sign_for(value, &raw);
    format!("{}{}", sign, localize(&raw, &options.locale))
}

// A value that rounds to zero is shown without a sign
fn sign_for(value: f64, rounded: &str) -> &'static str {
    let nonzero = rounded.chars().any(|c| c.is_ascii_digit() && c != '0');
    if value < 0.0 && nonzero {
        "-"
    } else {
        ""
    }
}

/// Apply locale separators to a `1234.50` style string
fn localize(raw: &str, locale: &NumberLocale) -> String {
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (raw, None),
    };

    let mut out = group_digits(int_part, locale.thousands_separator);
    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator);
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str, separator: Option<char>) -> String {
    let Some(separator) = separator else {
        return digits.to_string();
    };

    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
