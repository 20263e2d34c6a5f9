//! Dataset Loading & Cleaning
//!
//! Parses the three raw tables into cleaned, typed records. Schema-shape
//! problems (missing columns) abort the load; individual bad rows are
//! dropped, counted, and logged. The resulting `Dataset` is immutable:
//! every query runs against the same cleaned rows in input order.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::records::{CustomerRecord, CustomerType, ProductRecord, SalesRecord, UNKNOWN};
use crate::table::RawTable;

/// Relative tolerance for the `sales_amount == units_sold * unit_price`
/// consistency check. Rows outside it are dropped, not corrected.
const AMOUNT_RTOL: f64 = 1e-5;

const SALES_COLUMNS: [&str; 6] = [
    "date",
    "product_name",
    "customer_id",
    "units_sold",
    "unit_price",
    "sales_amount",
];
const PRODUCT_COLUMNS: [&str; 2] = ["product_name", "category"];
const CUSTOMER_COLUMNS: [&str; 3] = ["customer_id", "region", "customer_type"];

/// Per-reason counts of rows dropped during cleaning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub sales_rows_in: usize,
    pub sales_unparsable_date: usize,
    pub sales_unparsable_number: usize,
    pub sales_nonpositive: usize,
    pub sales_amount_mismatch: usize,
    pub product_rows_in: usize,
    pub product_duplicates: usize,
    pub product_incomplete: usize,
    pub customer_rows_in: usize,
    pub customer_duplicates: usize,
    pub customer_incomplete: usize,
    pub customer_invalid_type: usize,
}

impl CleaningReport {
    pub fn sales_dropped(&self) -> usize {
        self.sales_unparsable_date
            + self.sales_unparsable_number
            + self.sales_nonpositive
            + self.sales_amount_mismatch
    }

    fn log(&self) {
        if self.sales_dropped() > 0 {
            warn!(
                "Dropped {} sales rows during cleaning ({} bad dates, {} bad numbers, {} non-positive, {} amount mismatches)",
                self.sales_dropped(),
                self.sales_unparsable_date,
                self.sales_unparsable_number,
                self.sales_nonpositive,
                self.sales_amount_mismatch
            );
        }
        if self.product_duplicates + self.product_incomplete > 0 {
            warn!(
                "Dropped {} product rows ({} duplicates, {} incomplete)",
                self.product_duplicates + self.product_incomplete,
                self.product_duplicates,
                self.product_incomplete
            );
        }
        if self.customer_duplicates + self.customer_incomplete + self.customer_invalid_type > 0 {
            warn!(
                "Dropped {} customer rows ({} duplicates, {} incomplete, {} invalid types)",
                self.customer_duplicates + self.customer_incomplete + self.customer_invalid_type,
                self.customer_duplicates,
                self.customer_incomplete,
                self.customer_invalid_type
            );
        }
    }
}

/// The cleaned, immutable dataset the engine queries against.
#[derive(Debug, Clone)]
pub struct Dataset {
    sales: Vec<SalesRecord>,
    products: Vec<ProductRecord>,
    customers: Vec<CustomerRecord>,
    report: CleaningReport,
}

impl Dataset {
    /// Clean and join the three raw tables. Fails only on schema-shape
    /// problems; bad rows are dropped and counted.
    pub fn load(
        raw_sales: &RawTable,
        raw_products: &RawTable,
        raw_customers: &RawTable,
    ) -> Result<Self> {
        raw_sales.require_columns(&SALES_COLUMNS)?;
        raw_products.require_columns(&PRODUCT_COLUMNS)?;
        raw_customers.require_columns(&CUSTOMER_COLUMNS)?;

        let mut report = CleaningReport::default();
        let products = clean_products(raw_products, &mut report)?;
        let customers = clean_customers(raw_customers, &mut report)?;
        let sales = clean_sales(raw_sales, &products, &customers, &mut report)?;

        report.log();
        info!(
            "Loaded dataset: {} sales rows, {} products, {} customers",
            sales.len(),
            products.len(),
            customers.len()
        );

        Ok(Self {
            sales,
            products,
            customers,
            report,
        })
    }

    pub fn sales(&self) -> &[SalesRecord] {
        &self.sales
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn customers(&self) -> &[CustomerRecord] {
        &self.customers
    }

    pub fn report(&self) -> &CleaningReport {
        &self.report
    }
}

/// Accepted date formats, tried in order.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn parse_units(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 => Some(v as u64),
        _ => None,
    }
}

fn parse_amount(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn clean_products(raw: &RawTable, report: &mut CleaningReport) -> Result<Vec<ProductRecord>> {
    let name_idx = raw.column("product_name")?;
    let category_idx = raw.column("category")?;

    report.product_rows_in = raw.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut products = Vec::new();

    for row in raw.rows() {
        let product_name = raw.cell(row, name_idx).trim();
        let category = raw.cell(row, category_idx).trim();

        if product_name.is_empty() || category.is_empty() {
            report.product_incomplete += 1;
            continue;
        }
        // First occurrence wins; later duplicates are dropped.
        if !seen.insert(product_name.to_string()) {
            report.product_duplicates += 1;
            continue;
        }

        products.push(ProductRecord {
            product_name: product_name.to_string(),
            category: category.to_string(),
        });
    }

    Ok(products)
}

fn clean_customers(raw: &RawTable, report: &mut CleaningReport) -> Result<Vec<CustomerRecord>> {
    let id_idx = raw.column("customer_id")?;
    let region_idx = raw.column("region")?;
    let type_idx = raw.column("customer_type")?;

    report.customer_rows_in = raw.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut customers = Vec::new();

    for row in raw.rows() {
        let customer_id = raw.cell(row, id_idx).trim();
        let region = raw.cell(row, region_idx).trim();
        let customer_type = raw.cell(row, type_idx);

        if customer_id.is_empty() || region.is_empty() {
            report.customer_incomplete += 1;
            continue;
        }
        let customer_type = match CustomerType::parse(customer_type) {
            Some(t) => t,
            None => {
                report.customer_invalid_type += 1;
                continue;
            }
        };
        if !seen.insert(customer_id.to_string()) {
            report.customer_duplicates += 1;
            continue;
        }

        customers.push(CustomerRecord {
            customer_id: customer_id.to_string(),
            region: region.to_string(),
            customer_type,
        });
    }

    Ok(customers)
}

fn clean_sales(
    raw: &RawTable,
    products: &[ProductRecord],
    customers: &[CustomerRecord],
    report: &mut CleaningReport,
) -> Result<Vec<SalesRecord>> {
    let date_idx = raw.column("date")?;
    let product_idx = raw.column("product_name")?;
    let customer_idx = raw.column("customer_id")?;
    let units_idx = raw.column("units_sold")?;
    let price_idx = raw.column("unit_price")?;
    let amount_idx = raw.column("sales_amount")?;

    let category_by_product: HashMap<&str, &str> = products
        .iter()
        .map(|p| (p.product_name.as_str(), p.category.as_str()))
        .collect();
    let region_by_customer: HashMap<&str, &str> = customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c.region.as_str()))
        .collect();

    report.sales_rows_in = raw.len();
    let mut sales = Vec::new();

    for row in raw.rows() {
        let date = match parse_date(raw.cell(row, date_idx)) {
            Some(d) => d,
            None => {
                report.sales_unparsable_date += 1;
                continue;
            }
        };
        let (units_sold, unit_price, sales_amount) = match (
            parse_units(raw.cell(row, units_idx)),
            parse_amount(raw.cell(row, price_idx)),
            parse_amount(raw.cell(row, amount_idx)),
        ) {
            (Some(u), Some(p), Some(a)) => (u, p, a),
            _ => {
                report.sales_unparsable_number += 1;
                continue;
            }
        };
        if units_sold == 0 || unit_price <= 0.0 {
            report.sales_nonpositive += 1;
            continue;
        }
        let expected = units_sold as f64 * unit_price;
        if (sales_amount - expected).abs() > AMOUNT_RTOL * expected.abs() {
            report.sales_amount_mismatch += 1;
            continue;
        }

        let product_name = raw.cell(row, product_idx).trim().to_string();
        let customer_id = raw.cell(row, customer_idx).trim().to_string();
        let category = category_by_product
            .get(product_name.as_str())
            .map(|c| c.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let region = region_by_customer
            .get(customer_id.as_str())
            .map(|r| r.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());

        sales.push(SalesRecord {
            date,
            product_name,
            customer_id,
            region,
            category,
            units_sold,
            unit_price,
            sales_amount,
        });
    }

    Ok(sales)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    fn sales_table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            "sales",
            strings(&SALES_COLUMNS),
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    fn products_table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            "products",
            strings(&PRODUCT_COLUMNS),
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    fn customers_table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            "customers",
            strings(&CUSTOMER_COLUMNS),
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    fn load(sales: &[&[&str]], products: &[&[&str]], customers: &[&[&str]]) -> Dataset {
        Dataset::load(
            &sales_table(sales),
            &products_table(products),
            &customers_table(customers),
        )
        .unwrap()
    }

    #[test]
    fn test_clean_load_keeps_consistent_rows() {
        let ds = load(
            &[
                &["2023-01-01", "Aspirin", "C1", "10", "5.0", "50.0"],
                &["2023-02-01", "Paracetamol", "C2", "20", "10.0", "200.0"],
            ],
            &[&["Aspirin", "Pain Relief"], &["Paracetamol", "Pain Relief"]],
            &[&["C1", "East", "Hospital"], &["C2", "South", "Clinic"]],
        );

        assert_eq!(ds.sales().len(), 2);
        assert_eq!(ds.sales()[0].region, "East");
        assert_eq!(ds.sales()[0].category, "Pain Relief");
        assert_eq!(ds.report().sales_dropped(), 0);
    }

    #[test]
    fn test_amount_mismatch_dropped() {
        // 10 * 5.0 = 50, row claims 60: dropped, not corrected.
        let ds = load(
            &[
                &["2023-01-01", "Aspirin", "C1", "10", "5.0", "60.0"],
                &["2023-01-02", "Aspirin", "C1", "10", "5.0", "50.0"],
            ],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Hospital"]],
        );

        assert_eq!(ds.sales().len(), 1);
        assert_eq!(ds.report().sales_amount_mismatch, 1);
        assert_eq!(ds.sales()[0].sales_amount, 50.0);
    }

    #[test]
    fn test_amount_within_tolerance_kept() {
        let ds = load(
            &[&["2023-01-01", "Aspirin", "C1", "3", "33.33", "99.99"]],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Hospital"]],
        );
        assert_eq!(ds.sales().len(), 1);
    }

    #[test]
    fn test_unparsable_date_dropped() {
        let ds = load(
            &[
                &["not-a-date", "Aspirin", "C1", "10", "5.0", "50.0"],
                &["2023-01-02", "Aspirin", "C1", "10", "5.0", "50.0"],
            ],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Hospital"]],
        );

        assert_eq!(ds.sales().len(), 1);
        assert_eq!(ds.report().sales_unparsable_date, 1);
    }

    #[test]
    fn test_nonpositive_rows_dropped() {
        let ds = load(
            &[
                &["2023-01-01", "Aspirin", "C1", "0", "5.0", "0.0"],
                &["2023-01-02", "Aspirin", "C1", "10", "-1.0", "-10.0"],
                &["2023-01-03", "Aspirin", "C1", "10", "5.0", "50.0"],
            ],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Hospital"]],
        );

        assert_eq!(ds.sales().len(), 1);
        assert_eq!(ds.report().sales_nonpositive, 2);
    }

    #[test]
    fn test_duplicate_products_first_occurrence_wins() {
        let ds = load(
            &[&["2023-01-01", "Aspirin", "C1", "10", "5.0", "50.0"]],
            &[&["Aspirin", "Pain Relief"], &["Aspirin", "Antibiotics"]],
            &[&["C1", "East", "Hospital"]],
        );

        assert_eq!(ds.products().len(), 1);
        assert_eq!(ds.products()[0].category, "Pain Relief");
        assert_eq!(ds.sales()[0].category, "Pain Relief");
        assert_eq!(ds.report().product_duplicates, 1);
    }

    #[test]
    fn test_invalid_customer_type_dropped_and_region_unknown() {
        let ds = load(
            &[&["2023-01-01", "Aspirin", "C1", "10", "5.0", "50.0"]],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Wholesaler"]],
        );

        assert!(ds.customers().is_empty());
        assert_eq!(ds.report().customer_invalid_type, 1);
        // The sales row survives with the sentinel region.
        assert_eq!(ds.sales()[0].region, UNKNOWN);
    }

    #[test]
    fn test_unmatched_joins_fill_unknown() {
        let ds = load(
            &[&["2023-01-01", "Ibuprofen", "C9", "10", "5.0", "50.0"]],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Hospital"]],
        );

        assert_eq!(ds.sales()[0].region, UNKNOWN);
        assert_eq!(ds.sales()[0].category, UNKNOWN);
    }

    #[test]
    fn test_missing_columns_fatal() {
        let bad_sales = RawTable::new(
            "sales",
            strings(&["date", "product_name"]),
            vec![strings(&["2023-01-01", "Aspirin"])],
        );
        let err = Dataset::load(
            &bad_sales,
            &products_table(&[&["Aspirin", "Pain Relief"]]),
            &customers_table(&[&["C1", "East", "Hospital"]]),
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("units_sold"));
        assert!(msg.contains("sales_amount"));
    }

    #[test]
    fn test_alternate_date_formats() {
        let ds = load(
            &[
                &["2023/01/05", "Aspirin", "C1", "1", "5.0", "5.0"],
                &["01/06/2023", "Aspirin", "C1", "1", "5.0", "5.0"],
            ],
            &[&["Aspirin", "Pain Relief"]],
            &[&["C1", "East", "Hospital"]],
        );

        assert_eq!(ds.sales().len(), 2);
        assert_eq!(
            ds.sales()[0].date,
            NaiveDate::from_ymd_opt(2023, 1, 5).unwrap()
        );
        assert_eq!(
            ds.sales()[1].date,
            NaiveDate::from_ymd_opt(2023, 1, 6).unwrap()
        );
    }
}
