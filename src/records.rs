//! Core Record Types
//!
//! Cleaned rows of the three source tables. Raw inputs arrive as
//! `RawTable`s; the dataset module parses and validates them into these.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel dimension value for sales rows with no matching product or
/// customer row.
pub const UNKNOWN: &str = "Unknown";

/// One sales transaction, after cleaning and dimension backfill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product_name: String,
    pub customer_id: String,
    /// Joined from the customer table; "Unknown" when unmatched.
    pub region: String,
    /// Joined from the product table; "Unknown" when unmatched.
    pub category: String,
    pub units_sold: u64,
    pub unit_price: f64,
    pub sales_amount: f64,
}

/// One product, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_name: String,
    pub category: String,
}

/// The fixed set of customer types. Rows with any other value are dropped
/// during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    Hospital,
    Clinic,
    Pharmacy,
}

impl CustomerType {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("hospital") {
            Some(Self::Hospital)
        } else if s.eq_ignore_ascii_case("clinic") {
            Some(Self::Clinic)
        } else if s.eq_ignore_ascii_case("pharmacy") {
            Some(Self::Pharmacy)
        } else {
            None
        }
    }
}

/// One customer, keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub region: String,
    pub customer_type: CustomerType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_type_parse() {
        assert_eq!(CustomerType::parse("Hospital"), Some(CustomerType::Hospital));
        assert_eq!(CustomerType::parse(" clinic "), Some(CustomerType::Clinic));
        assert_eq!(CustomerType::parse("PHARMACY"), Some(CustomerType::Pharmacy));
        assert_eq!(CustomerType::parse("Wholesaler"), None);
        assert_eq!(CustomerType::parse(""), None);
    }
}
