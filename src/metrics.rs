use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::clean::normalize_product;
use crate::models::{DailyRevenue, ProductTotal, SalesRecord, SummaryMetrics};

/// Quantity totals saturate at the `i64` bounds; files read back through
/// `load_cleaned` skip the per-row limit applied while cleaning.
pub fn summarize(records: &[SalesRecord]) -> SummaryMetrics {
    let mut products = BTreeSet::new();
    let mut metrics = SummaryMetrics::default();

    for record in records {
        metrics.total_quantity = metrics.total_quantity.saturating_add(record.quantity);
        metrics.total_revenue += record.revenue();
        products.insert(record.product.as_str());
    }

    metrics.unique_products = products.len();
    metrics
}

/// Products ranked by quantity sold, highest first; ties break on name.
pub fn top_products(records: &[SalesRecord], limit: usize) -> Vec<ProductTotal> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for record in records {
        let total = totals.entry(record.product.as_str()).or_insert(0);
        *total = total.saturating_add(record.quantity);
    }

    let mut ranked: Vec<ProductTotal> = totals
        .into_iter()
        .map(|(product, quantity)| ProductTotal {
            product: product.to_string(),
            quantity,
        })
        .collect();
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.product.cmp(&b.product)));
    ranked.truncate(limit);
    ranked
}

pub fn daily_revenue(records: &[SalesRecord]) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (i64, f64)> = BTreeMap::new();
    for record in records {
        let entry = days.entry(record.date).or_insert((0, 0.0));
        entry.0 = entry.0.saturating_add(record.quantity);
        entry.1 += record.revenue();
    }

    days.into_iter()
        .map(|(date, (quantity, revenue))| DailyRevenue {
            date,
            quantity,
            revenue,
        })
        .collect()
}

/// Inclusive date-range slice; an open bound matches everything on that side.
pub fn filter_by_date(
    records: &[SalesRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|record| from.map_or(true, |from| record.date >= from))
        .filter(|record| to.map_or(true, |to| record.date <= to))
        .cloned()
        .collect()
}

/// Keeps rows whose product is one of `products`, compared after the same name
/// normalization cleaning applies. An empty selection keeps everything.
pub fn filter_by_products(records: &[SalesRecord], products: &[String]) -> Vec<SalesRecord> {
    if products.is_empty() {
        return records.to_vec();
    }
    let wanted: BTreeSet<String> = products
        .iter()
        .filter_map(|product| normalize_product(product))
        .collect();
    records
        .iter()
        .filter(|record| wanted.contains(&record.product))
        .cloned()
        .collect()
}
