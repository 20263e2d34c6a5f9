//! CSV Ingestion
//!
//! Reads source CSV files into the in-memory table shape the engine
//! consumes. This is the only place the crate touches the filesystem;
//! filtering and aggregation never do I/O.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use crate::error::{AnalyticsError, Result};
use crate::table::RawTable;

/// Read one CSV file into a raw table. The header row becomes the column
/// names; cells are kept as trimmed strings for the cleaning pass to parse.
pub fn read_csv_table(name: &str, path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            AnalyticsError::Ingestion(format!("Failed to open {}: {}", path.display(), e))
        })?;

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            (0..headers.len())
                .map(|i| record.get(i).unwrap_or("").trim().to_string())
                .collect(),
        );
    }

    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(RawTable::new(name, headers, rows))
}

/// Load the conventional three-file layout from a data directory:
/// `sales.csv`, `products.csv`, `customers.csv`.
pub fn load_data_dir(data_dir: &Path) -> Result<(RawTable, RawTable, RawTable)> {
    let sales = read_csv_table("sales", &data_dir.join("sales.csv"))?;
    let products = read_csv_table("products", &data_dir.join("products.csv"))?;
    let customers = read_csv_table("customers", &data_dir.join("customers.csv"))?;
    Ok((sales, products, customers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_csv_table() {
        let dir = std::env::temp_dir().join("sales_analytics_ingestion_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sales.csv");
        fs::write(
            &path,
            "date,product_name,customer_id,units_sold,unit_price,sales_amount\n\
             2023-01-01, Aspirin ,C1,10,5.0,50.0\n",
        )
        .unwrap();

        let table = read_csv_table("sales", &path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns()[1], "product_name");
        // Cells come back trimmed.
        assert_eq!(table.rows()[0][1], "Aspirin");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/sales.csv");
        assert!(read_csv_table("sales", path).is_err());
    }
}
