use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::models::{CleaningReport, RawRecord, SalesRecord};

/// What to do with a quantity or price that is missing or fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FillPolicy {
    /// Substitute zero.
    #[default]
    Zero,
    /// Substitute the median of the valid values in the same column.
    Median,
    /// Drop the row.
    Drop,
}

/// Common misspellings, applied after title-casing.
const PRODUCT_ALIASES: &[(&str, &str)] = &[
    ("Lptop", "Laptop"),
    ("Celphone", "Cellphone"),
    ("Smartwatch", "SmartWatch"),
    ("Keybord", "Keyboard"),
];

/// Where the year sits in a date format and how many digits it must have there.
/// chrono's `%Y` happily takes `24` as the year 24, so the width is checked up front.
enum YearField {
    Leading(usize),
    Trailing(usize),
}

const DATE_FORMATS: &[(&str, YearField)] = &[
    ("%Y-%m-%d", YearField::Leading(4)),
    ("%Y/%m/%d", YearField::Leading(4)),
    ("%m/%d/%Y", YearField::Trailing(4)),
    ("%m-%d-%Y", YearField::Trailing(4)),
    ("%m/%d/%y", YearField::Trailing(2)),
    ("%m-%d-%y", YearField::Trailing(2)),
    ("%d %B %Y", YearField::Trailing(4)),
    ("%B %d, %Y", YearField::Trailing(4)),
    ("%B %d %Y", YearField::Trailing(4)),
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Quantities beyond this magnitude are treated as malformed. Keeps every total over
/// an in-memory table far inside `i64`.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// A row whose text and date are settled but whose numbers may still need filling.
struct StagedRow {
    order_id: Option<String>,
    product: String,
    quantity: Option<i64>,
    price: Option<f64>,
    date: NaiveDate,
    region: Option<String>,
}

#[derive(PartialEq, Eq, Hash)]
struct RowKey {
    order_id: Option<String>,
    product: String,
    quantity: i64,
    price_bits: u64,
    date: NaiveDate,
    region: Option<String>,
}

impl From<&SalesRecord> for RowKey {
    fn from(record: &SalesRecord) -> Self {
        // -0.0 and 0.0 are the same price
        let price = if record.price == 0.0 { 0.0 } else { record.price };
        RowKey {
            order_id: record.order_id.clone(),
            product: record.product.clone(),
            quantity: record.quantity,
            price_bits: price.to_bits(),
            date: record.date,
            region: record.region.clone(),
        }
    }
}

/// Turns raw rows into cleaned sales records.
///
/// Each row is coerced and standardized first, then rows without a product or a
/// usable date are dropped, missing numbers are resolved through `fill`, and exact
/// duplicates are removed keeping the first occurrence. Input order is preserved and
/// negative values pass through untouched.
pub fn clean(raw: &[RawRecord], fill: FillPolicy) -> (Vec<SalesRecord>, CleaningReport) {
    let mut report = CleaningReport {
        rows_read: raw.len(),
        ..CleaningReport::default()
    };

    let mut staged = Vec::with_capacity(raw.len());
    for record in raw {
        let quantity = record.quantity.as_deref().and_then(parse_quantity);
        let price = record.price.as_deref().and_then(parse_price);
        let product = record.product.as_deref().and_then(normalize_product);
        let date = record.date.as_deref().and_then(parse_date);

        let Some(product) = product else {
            report.dropped_missing_product += 1;
            continue;
        };
        let Some(date) = date else {
            report.dropped_bad_date += 1;
            continue;
        };

        if quantity.is_none() {
            report.quantity_warnings += 1;
        }
        if price.is_none() {
            report.price_warnings += 1;
        }

        staged.push(StagedRow {
            order_id: record
                .order_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            product,
            quantity,
            price,
            date,
            region: record.region.as_deref().and_then(normalize_region),
        });
    }

    let (quantity_fill, price_fill) = match fill {
        FillPolicy::Zero => (Some(0), Some(0.0)),
        FillPolicy::Median => {
            let quantities: Vec<f64> = staged
                .iter()
                .filter_map(|row| row.quantity.map(|q| q as f64))
                .collect();
            let prices: Vec<f64> = staged.iter().filter_map(|row| row.price).collect();
            let quantity = median(&quantities).map(|m| m.round() as i64).unwrap_or(0);
            let price = median(&prices).unwrap_or(0.0);
            debug!(quantity, price, "median fill values");
            (Some(quantity), Some(price))
        }
        FillPolicy::Drop => (None, None),
    };

    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(staged.len());
    for row in staged {
        let (Some(quantity), Some(price)) =
            (row.quantity.or(quantity_fill), row.price.or(price_fill))
        else {
            report.dropped_missing_numeric += 1;
            continue;
        };

        let record = SalesRecord {
            order_id: row.order_id,
            product: row.product,
            quantity,
            price,
            date: row.date,
            region: row.region,
        };

        if !seen.insert(RowKey::from(&record)) {
            report.duplicates_removed += 1;
            continue;
        }

        if record.quantity < 0 || record.price < 0.0 {
            report.negative_rows += 1;
        }
        cleaned.push(record);
    }
    report.rows_kept = cleaned.len();

    if report.coercion_warnings() > 0 {
        warn!(
            quantity = report.quantity_warnings,
            price = report.price_warnings,
            policy = ?fill,
            "rows with missing or malformed numeric values"
        );
    }
    if report.negative_rows > 0 {
        debug!(rows = report.negative_rows, "negative quantity or price passed through");
    }
    info!(
        read = report.rows_read,
        kept = report.rows_kept,
        missing_product = report.dropped_missing_product,
        bad_date = report.dropped_bad_date,
        missing_numeric = report.dropped_missing_numeric,
        duplicates = report.duplicates_removed,
        "cleaning complete"
    );

    (cleaned, report)
}

fn collapse_whitespace(value: &str) -> Option<String> {
    let joined = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut in_word = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            output.push(ch);
            in_word = false;
        }
    }
    output
}

pub fn normalize_product(value: &str) -> Option<String> {
    let titled = title_case(&collapse_whitespace(value)?);
    let name = PRODUCT_ALIASES
        .iter()
        .find(|(from, _)| *from == titled)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(titled);
    Some(name)
}

fn normalize_region(value: &str) -> Option<String> {
    collapse_whitespace(value).map(|region| title_case(&region))
}

pub fn parse_quantity(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let cleaned: String = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let quantity = match cleaned.parse::<i64>() {
        Ok(quantity) => quantity,
        Err(_) => {
            // integral decimals such as "3.0"
            let parsed = cleaned.parse::<f64>().ok()?;
            let out_of_range = parsed.abs() > MAX_QUANTITY as f64;
            if !parsed.is_finite() || parsed.fract() != 0.0 || out_of_range {
                return None;
            }
            parsed as i64
        }
    };
    (-MAX_QUANTITY..=MAX_QUANTITY)
        .contains(&quantity)
        .then_some(quantity)
}

pub fn parse_price(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.trim_start().strip_prefix('$').unwrap_or(rest);
    let cleaned: String = rest.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }
    let price = cleaned.parse::<f64>().ok().filter(|p| p.is_finite())?;
    Some(if negative { -price } else { price })
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[..4].parse().ok()?;
        let month = value[4..6].parse().ok()?;
        let day = value[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    DATE_FORMATS
        .iter()
        .filter(|(_, year)| year_width_matches(value, year))
        .find_map(|(format, _)| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            if !year_width_matches(value, &YearField::Leading(4)) {
                return None;
            }
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

fn year_width_matches(value: &str, year: &YearField) -> bool {
    match *year {
        YearField::Leading(width) => {
            value.chars().take_while(char::is_ascii_digit).count() == width
        }
        YearField::Trailing(width) => {
            value.chars().rev().take_while(char::is_ascii_digit).count() == width
        }
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
