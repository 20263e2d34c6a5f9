//! Filter Specification & Application
//!
//! All constraints are optional and applied conjunctively in a fixed order:
//! date range, region set, category set, exact product, free-text search,
//! amount range. An absent or empty constraint passes every row. Filtering
//! is stable: rows come back in dataset order.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{AnalyticsError, Result};
use crate::records::SalesRecord;

/// User-selected constraints narrowing the dataset before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub regions: Option<HashSet<String>>,
    pub categories: Option<HashSet<String>>,
    pub product: Option<String>,
    pub search_text: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_regions<I: IntoIterator<Item = String>>(mut self, regions: I) -> Self {
        self.regions = Some(regions.into_iter().collect());
        self
    }

    pub fn with_categories<I: IntoIterator<Item = String>>(mut self, categories: I) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search_text = Some(search.into());
        self
    }

    pub fn with_amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    /// Predicate order is fixed for determinism; contradictory bounds
    /// simply match nothing.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        if let Some(start) = self.start_date {
            if record.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.date > end {
                return false;
            }
        }
        // An empty selection means "no restriction", not "nothing".
        if let Some(regions) = &self.regions {
            if !regions.is_empty() && !regions.contains(&record.region) {
                return false;
            }
        }
        if let Some(categories) = &self.categories {
            if !categories.is_empty() && !categories.contains(&record.category) {
                return false;
            }
        }
        if let Some(product) = &self.product {
            if !product.is_empty() && record.product_name != *product {
                return false;
            }
        }
        if let Some(search) = &self.search_text {
            let search = search.trim().to_lowercase();
            if !search.is_empty()
                && !record.product_name.to_lowercase().contains(&search)
                && !record.customer_id.to_lowercase().contains(&search)
            {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if record.sales_amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if record.sales_amount > max {
                return false;
            }
        }
        true
    }
}

/// String-encoded request parameters, mapped 1:1 from a collaborator's
/// query string or widget state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub product: Option<String>,
    pub search: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl FilterParams {
    /// Parse string-encoded parameters into a typed spec. Malformed dates
    /// are the caller's mistake and surface as errors; empty selections
    /// become absent constraints.
    pub fn into_spec(self) -> Result<FilterSpec> {
        let start_date = self.start_date.as_deref().map(parse_param_date).transpose()?;
        let end_date = self.end_date.as_deref().map(parse_param_date).transpose()?;

        Ok(FilterSpec {
            start_date,
            end_date,
            regions: non_empty_set(self.regions),
            categories: non_empty_set(self.categories),
            product: self.product.filter(|p| !p.trim().is_empty()),
            search_text: self.search.filter(|s| !s.trim().is_empty()),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        })
    }
}

fn parse_param_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AnalyticsError::Filter(format!("Invalid date parameter: '{}'", s)))
}

fn non_empty_set(values: Vec<String>) -> Option<HashSet<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.into_iter().collect())
    }
}

/// Apply a filter spec to the dataset, preserving input order.
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> Vec<&'a SalesRecord> {
    dataset.sales().iter().filter(|r| spec.matches(r)).collect()
}
