use std::io::Write;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::error::CleanError;
use crate::models::{RawRecord, SalesRecord};

pub const OUTPUT_HEADER: [&str; 6] = [
    "Order ID",
    "Product Name",
    "Quantity",
    "Price",
    "Date",
    "Region",
];

const PRODUCT_ALIASES: &[&str] = &["product name", "product", "item"];
const QUANTITY_ALIASES: &[&str] = &["quantity", "qty"];
const PRICE_ALIASES: &[&str] = &["price", "unit price"];
const DATE_ALIASES: &[&str] = &["date", "order date"];
const ORDER_ID_ALIASES: &[&str] = &["order id", "id"];
const REGION_ALIASES: &[&str] = &["region"];

/// Positions of the known columns inside one input file.
#[derive(Debug, PartialEq)]
struct ColumnMap {
    order_id: Option<usize>,
    product: usize,
    quantity: usize,
    price: usize,
    date: usize,
    region: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self, CleanError> {
        let names: Vec<String> = headers.iter().map(header_key).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| names.iter().position(|name| name.as_str() == *alias))
        };

        let product = find(PRODUCT_ALIASES);
        let quantity = find(QUANTITY_ALIASES);
        let price = find(PRICE_ALIASES);
        let date = find(DATE_ALIASES);

        match (product, quantity, price, date) {
            (Some(product), Some(quantity), Some(price), Some(date)) => Ok(ColumnMap {
                order_id: find(ORDER_ID_ALIASES),
                product,
                quantity,
                price,
                date,
                region: find(REGION_ALIASES),
            }),
            _ => {
                let missing = [
                    (product, "Product Name"),
                    (quantity, "Quantity"),
                    (price, "Price"),
                    (date, "Date"),
                ]
                .into_iter()
                .filter(|(index, _)| index.is_none())
                .map(|(_, name)| name)
                .collect();
                Err(CleanError::MissingColumns {
                    path: path.to_path_buf(),
                    missing,
                })
            }
        }
    }

    fn extract(&self, record: &StringRecord) -> RawRecord {
        let field = |index: usize| record.get(index).map(str::to_string);
        RawRecord {
            order_id: self.order_id.and_then(field),
            product: field(self.product),
            quantity: field(self.quantity),
            price: field(self.price),
            date: field(self.date),
            region: self.region.and_then(field),
        }
    }
}

/// Lower-cased header with `_`/`-` read as spaces and runs of whitespace collapsed.
fn header_key(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reads a raw sales CSV with a header row.
///
/// Short or long rows are tolerated; cells that are absent come back as `None`. A
/// header-only file yields an empty table.
pub fn load(path: &Path) -> Result<Vec<RawRecord>, CleanError> {
    if !path.is_file() {
        return Err(CleanError::InputNotFound(path.to_path_buf()));
    }
    let input_err = |source: csv::Error| CleanError::Input {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(input_err)?;
    let headers = reader.headers().map_err(input_err)?.clone();
    let columns = ColumnMap::resolve(&headers, path)?;
    debug!(?columns, "resolved input columns");

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(input_err)?;
        records.push(columns.extract(&record));
    }

    info!(rows = records.len(), path = %path.display(), "loaded raw sales data");
    Ok(records)
}

/// Writes cleaned records to `destination`, replacing whatever is there.
///
/// The file is staged next to the destination and renamed into place, so readers
/// never observe a half-written file.
pub fn persist(records: &[SalesRecord], destination: &Path) -> Result<(), CleanError> {
    let output_err = |source: std::io::Error| CleanError::Output {
        path: destination.to_path_buf(),
        source,
    };
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let staging = tempfile::NamedTempFile::new_in(parent).map_err(output_err)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(staging);
    writer
        .write_record(OUTPUT_HEADER)
        .map_err(|e| output_err(e.into()))?;
    for record in records {
        writer.serialize(record).map_err(|e| output_err(e.into()))?;
    }

    let mut staging = writer
        .into_inner()
        .map_err(|e| output_err(e.into_error()))?;
    staging.flush().map_err(output_err)?;
    staging
        .persist(destination)
        .map_err(|e| output_err(e.error))?;

    info!(rows = records.len(), path = %destination.display(), "wrote cleaned sales data");
    Ok(())
}

/// Reads a file produced by [`persist`] back into typed records.
pub fn load_cleaned(path: &Path) -> Result<Vec<SalesRecord>, CleanError> {
    if !path.is_file() {
        return Err(CleanError::InputNotFound(path.to_path_buf()));
    }
    let input_err = |source: csv::Error| CleanError::Input {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(input_err)?;
    let records = reader
        .deserialize::<SalesRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(input_err)?;

    debug!(rows = records.len(), path = %path.display(), "loaded cleaned sales data");
    Ok(records)
}
