//! Query Engine
//!
//! The single owner of the cleaned dataset and the sole producer of
//! aggregates. Collaborators (web handler, dashboard UI, report generator)
//! hand it a filter spec and receive a plain `MetricsResult` back; they own
//! no aggregation logic themselves.
//!
//! Every method takes `&self`: one engine instance can be shared across
//! callers without locking.

use chrono::NaiveDate;
use itertools::Itertools;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::filter::{self, FilterSpec};
use crate::metrics::{self, MetricsResult, YoyGrowth};
use crate::records::SalesRecord;
use crate::table::RawTable;

pub struct QueryEngine {
    dataset: Dataset,
}

impl QueryEngine {
    /// Clean the raw tables and build an engine over the result.
    pub fn load(
        raw_sales: &RawTable,
        raw_products: &RawTable,
        raw_customers: &RawTable,
    ) -> Result<Self> {
        let dataset = Dataset::load(raw_sales, raw_products, raw_customers)?;
        Ok(Self { dataset })
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Filtered rows in dataset order. A spec with no constraints returns
    /// the full cleaned dataset.
    pub fn filter(&self, spec: &FilterSpec) -> Vec<&SalesRecord> {
        filter::apply(&self.dataset, spec)
    }

    /// Filter and aggregate in one call.
    pub fn query(&self, spec: &FilterSpec) -> MetricsResult {
        let rows = self.filter(spec);
        debug!(
            "Query matched {} of {} sales rows",
            rows.len(),
            self.dataset.sales().len()
        );
        metrics::aggregate(&rows)
    }

    /// Year-over-year sales for the reference year, over the filtered rows.
    pub fn year_over_year(&self, spec: &FilterSpec, reference_year: i32) -> YoyGrowth {
        let rows = self.filter(spec);
        metrics::year_over_year(&rows, reference_year)
    }

    /// Distinct product names, sorted, for populating filter controls.
    pub fn product_names(&self) -> Vec<String> {
        self.dataset
            .sales()
            .iter()
            .map(|r| r.product_name.clone())
            .unique()
            .sorted()
            .collect()
    }

    /// Distinct regions, sorted.
    pub fn regions(&self) -> Vec<String> {
        self.dataset
            .sales()
            .iter()
            .map(|r| r.region.clone())
            .unique()
            .sorted()
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.dataset
            .sales()
            .iter()
            .map(|r| r.category.clone())
            .unique()
            .sorted()
            .collect()
    }

    /// Earliest and latest sale dates, `None` on an empty dataset.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.dataset.sales().iter().map(|r| r.date).min()?;
        let max = self.dataset.sales().iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}
