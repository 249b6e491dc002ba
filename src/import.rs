// 📥 Quote Import - JSON documents and long-format CSV cost sheets
//
// CSV layout, one row per product cost:
//   product,quantity,estimated_hours,cost_name,cost_value
//   Widget,1,2,shipping,10
//   Widget,,,packaging,5
//   Gadget,2,3,shipping,8
// Products keep first-seen order. Empty quantity/hours keep earlier values.
// Rows group by product name, or by the optional `product_id` column when it
// is filled in, so two products may share a name if their ids differ.

use crate::quote::{Product, Quote};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CostRow {
    #[serde(default)]
    product_id: Option<String>,
    product: String,
    quantity: Option<f64>,
    estimated_hours: Option<f64>,
    cost_name: Option<String>,
    cost_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ProductKey {
    Id(String),
    Name(String),
}

/// Load a quote, picking the format from the file extension
pub fn load_quote(path: &Path) -> Result<Quote> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_quote_json(path),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => load_quote_csv(path),
        _ => bail!("Unsupported quote file (expected .json or .csv): {:?}", path),
    }
}

pub fn load_quote_json(path: &Path) -> Result<Quote> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read quote file: {:?}", path))?;
    read_quote_json(&content)
}

pub fn read_quote_json(content: &str) -> Result<Quote> {
    let quote: Quote = serde_json::from_str(content).context("Failed to parse quote JSON")?;
    let quote = Quote::from_products(quote.products().to_vec());
    quote.check_cost_names().context("Invalid quote JSON")?;
    Ok(quote)
}

pub fn load_quote_csv(path: &Path) -> Result<Quote> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    read_quote_csv(file)
}

pub fn read_quote_csv<R: Read>(reader: R) -> Result<Quote> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut products: Vec<Product> = Vec::new();
    let mut index_by_key: HashMap<ProductKey, usize> = HashMap::new();

    for (i, result) in rdr.deserialize().enumerate() {
        // Header is line 1
        let line = i + 2;
        let row: CostRow = result.with_context(|| format!("Failed to deserialize CSV line {}", line))?;

        if row.product.is_empty() {
            bail!("CSV line {}: product name is empty", line);
        }

        let product_id = row.product_id.filter(|id| !id.is_empty());
        let key = match &product_id {
            Some(id) => ProductKey::Id(id.clone()),
            None => ProductKey::Name(row.product.clone()),
        };

        let index = *index_by_key.entry(key).or_insert_with(|| {
            let mut product = Product::new(row.product.clone());
            if let Some(id) = &product_id {
                product.id = id.clone();
            }
            products.push(product);
            products.len() - 1
        });
        let product = &mut products[index];

        if product.name != row.product {
            bail!(
                "CSV line {}: product id '{}' was first seen as '{}', not '{}'",
                line,
                product.id,
                product.name,
                row.product
            );
        }

        if let Some(quantity) = row.quantity {
            product.quantity = quantity;
        }
        if let Some(hours) = row.estimated_hours {
            product.estimated_hours = hours;
        }

        match (row.cost_name.filter(|name| !name.is_empty()), row.cost_value) {
            (Some(name), Some(value)) => {
                if product.has_cost(&name) {
                    bail!(
                        "CSV line {}: product '{}' already has a cost named '{}'",
                        line,
                        product.name,
                        name
                    );
                }
                *product = product.clone().with_cost(name, value);
            }
            (Some(name), None) => {
                bail!("CSV line {}: cost '{}' has no value", line, name);
            }
            (None, _) => {}
        }
    }

    tracing::debug!(products = products.len(), "imported quote from CSV");
    Ok(Quote::from_products(products))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
product,quantity,estimated_hours,cost_name,cost_value
Widget,1,2,shipping,10
Widget,,,packaging,5
Gadget,2,3,shipping,8
Gizmo,1,0.5,,
";

    #[test]
    fn test_read_csv_groups_products() {
        let quote = read_quote_csv(SAMPLE_CSV.as_bytes()).unwrap();

        assert_eq!(quote.len(), 3);
        let widget = &quote.products()[0];
        assert_eq!(widget.name, "Widget");
        assert_eq!(widget.estimated_hours, 2.0);
        assert_eq!(widget.cost("shipping"), Some(10.0));
        assert_eq!(widget.cost("packaging"), Some(5.0));

        let gadget = &quote.products()[1];
        assert_eq!(gadget.quantity, 2.0);
        assert_eq!(gadget.costs.len(), 1);

        let gizmo = &quote.products()[2];
        assert!(gizmo.costs.is_empty());
        assert_eq!(gizmo.estimated_hours, 0.5);
    }

    #[test]
    fn test_read_csv_rejects_duplicate_cost() {
        let data = "\
product,quantity,estimated_hours,cost_name,cost_value
Widget,1,2,shipping,10
Widget,,,shipping,12
";
        let err = read_quote_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_read_csv_rejects_missing_value() {
        let data = "\
product,quantity,estimated_hours,cost_name,cost_value
Widget,1,2,shipping,
";
        assert!(read_quote_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_csv_rejects_bad_number() {
        let data = "\
product,quantity,estimated_hours,cost_name,cost_value
Widget,1,two,shipping,10
";
        let err = read_quote_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_read_json_assigns_ids() {
        let quote = read_quote_json(
            r#"{"products": [
                {"name": "Widget", "estimated_hours": 2, "costs": [{"name": "shipping", "value": 10}]},
                {"id": "fixed", "name": "Gadget"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(quote.len(), 2);
        assert!(!quote.products()[0].id.is_empty());
        assert_eq!(quote.products()[1].id, "fixed");
        assert_eq!(quote.products()[0].cost("shipping"), Some(10.0));
    }

    #[test]
    fn test_read_csv_product_id_keeps_same_named_products_apart() {
        let data = "\
product_id,product,quantity,estimated_hours,cost_name,cost_value
w-1,Widget,1,2,shipping,10
w-2,Widget,3,1,shipping,4
w-1,Widget,,,packaging,5
";
        let quote = read_quote_csv(data.as_bytes()).unwrap();

        assert_eq!(quote.len(), 2);
        assert_eq!(quote.products()[0].id, "w-1");
        assert_eq!(quote.products()[0].cost("packaging"), Some(5.0));
        assert_eq!(quote.products()[1].id, "w-2");
        assert_eq!(quote.products()[1].quantity, 3.0);
    }

    #[test]
    fn test_read_csv_product_id_name_mismatch() {
        let data = "\
product_id,product,quantity,estimated_hours,cost_name,cost_value
w-1,Widget,1,2,shipping,10
w-1,Gadget,1,2,packaging,5
";
        let err = read_quote_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_read_json_rejects_duplicate_cost() {
        let err = read_quote_json(
            r#"{"products": [
                {"name": "Widget", "costs": [{"name": "shipping", "value": 10}, {"name": "shipping", "value": 5}]}
            ]}"#,
        )
        .unwrap_err();

        assert!(format!("{:#}", err).contains("already has a cost named 'shipping'"));
    }

    #[test]
    fn test_load_quote_unsupported_extension() {
        let err = load_quote(Path::new("quote.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported quote file"));
    }
}
