use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One unvalidated input row. Every field is the raw cell text, `None` when the
/// column is absent from the row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub order_id: Option<String>,
    pub product: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub date: Option<String>,
    pub region: Option<String>,
}

/// A validated, normalized, deduplicated sales row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "Order ID")]
    pub order_id: Option<String>,
    #[serde(rename = "Product Name")]
    pub product: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Region")]
    pub region: Option<String>,
}

impl SalesRecord {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_quantity: i64,
    pub total_revenue: f64,
    pub unique_products: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTotal {
    pub product: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub quantity: i64,
    pub revenue: f64,
}

/// Row accounting for a single `clean` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub dropped_missing_product: usize,
    pub dropped_bad_date: usize,
    pub dropped_missing_numeric: usize,
    pub duplicates_removed: usize,
    pub quantity_warnings: usize,
    pub price_warnings: usize,
    pub negative_rows: usize,
    pub rows_kept: usize,
}

impl CleaningReport {
    pub fn coercion_warnings(&self) -> usize {
        self.quantity_warnings + self.price_warnings
    }
}
