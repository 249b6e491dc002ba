use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use quote_pricing::{
    load_quote, FormatOptions, PricingConfig, PricingEngine, PricingReport, Quote,
    QuoteValidator, ScenarioInputs, VERSION,
};

/// Price a quote under the three contribution-margin scenarios
#[derive(Debug, Parser)]
#[command(name = "quote-pricing", version = VERSION)]
struct Cli {
    /// Quote file (.json or .csv)
    quote: PathBuf,

    /// Pricing config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target contribution margin, percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    target_percent: f64,

    /// Manually entered selling price
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    manual_price: f64,

    /// Price per item
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    price_per_item: f64,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PricingConfig::from_file(path)?,
        None => PricingConfig::default(),
    };
    let options = config.format_options()?;

    let quote = load_quote(&cli.quote)
        .with_context(|| format!("Failed to load quote: {:?}", cli.quote))?;

    if let Err(errors) = QuoteValidator::new().validate_quote(&quote) {
        eprintln!("❌ Quote has {} validation issue(s):", errors.len());
        for error in &errors {
            eprintln!("   {}", error);
        }
        process::exit(1);
    }

    let inputs = ScenarioInputs::new(cli.target_percent, cli.manual_price, cli.price_per_item);
    let engine = PricingEngine::with_config(&config);
    let report = engine.price(&quote, &inputs)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&quote, &report, &options);
    }

    Ok(())
}

fn print_report(quote: &Quote, report: &PricingReport, options: &FormatOptions) {
    println!("📊 {}", report.summary());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Product table: one line per column, one cell per product, footer total last.
    // Contribution columns only have footers and are listed after the scenarios.
    println!("\n🧾 Products");
    for column in report.columns.iter().filter(|c| !c.is_contribution()) {
        let cells: Vec<String> = quote
            .products()
            .iter()
            .map(|product| column.display(product, options))
            .collect();
        let footer = report
            .aggregates
            .get(&column.id)
            .map(|total| quote_pricing::format_value(Some(total), column.format, options))
            .unwrap_or_default();

        println!(
            "{:<24} {:<40} {:>14}",
            truncate(&column.label, 24),
            truncate(&cells.join(" | "), 40),
            footer
        );
    }

    println!("\n💵 Scenarios");
    println!(
        "{:<24} {:>22} {:>22} {:>22}",
        "", report.totals.headers[0], report.totals.headers[1], report.totals.headers[2]
    );
    for (label, values) in report.totals.render(options) {
        println!(
            "{:<24} {:>22} {:>22} {:>22}",
            truncate(&label, 24),
            values[0],
            values[1],
            values[2]
        );
    }

    println!("\n📈 Contribution");
    for row in &report.contribution_footers {
        let values = row.formatted(options);
        println!(
            "{:<24} {:>22} {:>22} {:>22}",
            truncate(&row.label, 24),
            values[0],
            values[1],
            values[2]
        );
    }

    for record in &report.scenario_records {
        if let Some(error) = &record.error {
            println!("\n⚠️  {}", error);
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
