use std::fmt::Write;

use chrono::NaiveDate;

use crate::metrics;
use crate::models::SalesRecord;

fn range_label(from: Option<NaiveDate>, to: Option<NaiveDate>) -> String {
    match (from, to) {
        (Some(from), Some(to)) => format!("{from} to {to}"),
        (Some(from), None) => format!("{from} onward"),
        (None, Some(to)) => format!("up to {to}"),
        (None, None) => "all dates".to_string(),
    }
}

pub fn build_report(
    records: &[SalesRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    products: &[String],
    top: usize,
) -> String {
    let in_range = metrics::filter_by_date(records, from, to);
    let selected = metrics::filter_by_products(&in_range, products);
    let summary = metrics::summarize(&selected);
    let top_products = metrics::top_products(&selected, top);
    let days = metrics::daily_revenue(&selected);

    let mut output = String::new();

    let _ = writeln!(output, "# Sales Performance Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} rows)",
        range_label(from, to),
        selected.len()
    );
    if !products.is_empty() {
        let _ = writeln!(output, "Products: {}", products.join(", "));
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall Sales Metrics");
    let _ = writeln!(output, "- Total quantity: {}", summary.total_quantity);
    let _ = writeln!(output, "- Total revenue: {:.2}", summary.total_revenue);
    let _ = writeln!(output, "- Unique products: {}", summary.unique_products);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top {} Products by Quantity", top);

    if top_products.is_empty() {
        let _ = writeln!(output, "No sales recorded for this range.");
    } else {
        for (rank, product) in top_products.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {}: {} units",
                rank + 1,
                product.product,
                product.quantity
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Revenue");

    if days.is_empty() {
        let _ = writeln!(output, "No sales recorded for this range.");
    } else {
        let _ = writeln!(output, "| Date | Quantity | Revenue |");
        let _ = writeln!(output, "| --- | ---: | ---: |");
        for day in days.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} |",
                day.date, day.quantity, day.revenue
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(product: &str, quantity: i64, price: f64, day: u32) -> SalesRecord {
        SalesRecord {
            order_id: None,
            product: product.to_string(),
            quantity,
            price,
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            region: None,
        }
    }

    #[test]
    fn report_lists_metrics_products_and_days() {
        let records = vec![
            record("Laptop", 2, 900.0, 1),
            record("Mouse", 5, 20.0, 1),
            record("Laptop", 1, 900.0, 3),
        ];
        let report = build_report(&records, None, None, &[], 5);

        assert!(report.starts_with("# Sales Performance Report\nGenerated for all dates (3 rows)"));
        assert!(report.contains("- Total quantity: 8"));
        assert!(report.contains("- Total revenue: 2800.00"));
        assert!(report.contains("1. Mouse: 5 units\n2. Laptop: 3 units"));
        assert!(report.contains("| 2024-02-01 | 7 | 1900.00 |"));
        assert!(report.contains("| 2024-02-03 | 1 | 900.00 |"));
    }

    #[test]
    fn report_respects_date_range() {
        let records = vec![record("Laptop", 2, 900.0, 1), record("Mouse", 5, 20.0, 9)];
        let from = NaiveDate::from_ymd_opt(2024, 2, 5);
        let report = build_report(&records, from, None, &[], 5);

        assert!(report.contains("Generated for 2024-02-05 onward (1 rows)"));
        assert!(report.contains("- Unique products: 1"));
        assert!(!report.contains("Laptop"));
    }

    #[test]
    fn empty_range_still_renders() {
        let report = build_report(&[], None, None, &[], 5);
        assert!(report.contains("- Total revenue: 0.00"));
        assert!(report.contains("No sales recorded for this range."));
    }

    #[test]
    fn report_narrows_to_selected_products() {
        let records = vec![
            record("Laptop", 2, 900.0, 1),
            record("Mouse", 5, 20.0, 1),
            record("Keyboard", 1, 50.0, 2),
        ];
        let products = vec!["mouse".to_string(), "keybord".to_string()];
        let report = build_report(&records, None, None, &products, 5);

        assert!(report.contains("Generated for all dates (2 rows)\nProducts: mouse, keybord"));
        assert!(report.contains("- Total revenue: 150.00"));
        assert!(report.contains("1. Mouse: 5 units\n2. Keyboard: 1 units"));
        assert!(!report.contains("Laptop"));
    }
}
