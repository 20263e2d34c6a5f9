//! Metric Computation
//!
//! Pure aggregation over an already-filtered set of sales rows. Every
//! function here is deterministic in its inputs; an empty input produces
//! zero/sentinel values, never an error.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::records::SalesRecord;

/// Sentinel for top-dimension values on an empty filtered set.
pub const NO_DATA: &str = "N/A";

/// Trailing window length for the daily moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 7;

/// Sales summed over one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// Month key in `YYYY-MM` form.
    pub month: String,
    pub sales_amount: f64,
}

/// Sales summed over one dimension value (product, region, or category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTotal {
    pub name: String,
    pub sales_amount: f64,
}

/// One point of the daily series, with its trailing moving average once
/// enough history exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub sales_amount: f64,
    /// Absent for the first `MOVING_AVERAGE_WINDOW - 1` points.
    pub moving_average: Option<f64>,
}

/// The full set of derived metrics for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub total_sales: f64,
    pub total_units: u64,
    pub total_orders: usize,
    /// 0 when there are no orders.
    pub avg_order_value: f64,
    /// Ascending by month key.
    pub monthly_trend: Vec<MonthlySales>,
    /// Ascending by summed amount (horizontal-bar convention).
    pub product_summary: Vec<DimensionTotal>,
    pub regional_summary: Vec<DimensionTotal>,
    pub category_summary: Vec<DimensionTotal>,
    /// "N/A" on an empty filtered set.
    pub top_product: String,
    pub top_region: String,
    /// Percent change from the first to the last day of the series; 0 when
    /// fewer than two days exist or the first day is zero.
    pub growth_rate: f64,
    pub moving_average: Vec<DailyPoint>,
}

/// Year-over-year comparison for a reference year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoyGrowth {
    pub reference_year: i32,
    pub current: f64,
    pub previous: f64,
    /// 0 when the previous year has no sales.
    pub growth_pct: f64,
}

/// Compute every derived metric over the filtered rows.
pub fn aggregate(rows: &[&SalesRecord]) -> MetricsResult {
    let total_sales: f64 = rows.iter().map(|r| r.sales_amount).sum();
    let total_units: u64 = rows.iter().map(|r| r.units_sold).sum();
    let total_orders = rows.len();
    let avg_order_value = if total_orders == 0 {
        0.0
    } else {
        total_sales / total_orders as f64
    };

    let daily = daily_series(rows);
    let product_summary = dimension_summary(rows, |r| r.product_name.as_str());
    let regional_summary = dimension_summary(rows, |r| r.region.as_str());
    let category_summary = dimension_summary(rows, |r| r.category.as_str());
    let top_product = top_dimension(&product_summary);
    let top_region = top_dimension(&regional_summary);

    MetricsResult {
        total_sales,
        total_units,
        total_orders,
        avg_order_value,
        monthly_trend: monthly_trend(rows),
        product_summary,
        regional_summary,
        category_summary,
        top_product,
        top_region,
        growth_rate: growth_rate(&daily),
        moving_average: moving_average(&daily),
    }
}

/// Sum sales for the reference year against the year before it.
pub fn year_over_year(rows: &[&SalesRecord], reference_year: i32) -> YoyGrowth {
    let year_sum = |year: i32| -> f64 {
        rows.iter()
            .filter(|r| r.date.year() == year)
            .map(|r| r.sales_amount)
            .sum()
    };
    let current = year_sum(reference_year);
    let previous = year_sum(reference_year - 1);
    let growth_pct = if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    };

    YoyGrowth {
        reference_year,
        current,
        previous,
        growth_pct,
    }
}

fn monthly_trend(rows: &[&SalesRecord]) -> Vec<MonthlySales> {
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for r in rows {
        let key = format!("{:04}-{:02}", r.date.year(), r.date.month());
        *by_month.entry(key).or_insert(0.0) += r.sales_amount;
    }
    by_month
        .into_iter()
        .map(|(month, sales_amount)| MonthlySales {
            month,
            sales_amount,
        })
        .collect()
}

/// Group by a dimension and sum, ascending by sum. Ties keep name order,
/// so the result is fully deterministic.
fn dimension_summary<'a, F>(rows: &[&'a SalesRecord], key: F) -> Vec<DimensionTotal>
where
    F: Fn(&'a SalesRecord) -> &'a str,
{
    let mut by_key: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        *by_key.entry(key(r)).or_insert(0.0) += r.sales_amount;
    }
    by_key
        .into_iter()
        .map(|(name, sales_amount)| DimensionTotal {
            name: name.to_string(),
            sales_amount,
        })
        .sorted_by(|a, b| a.sales_amount.total_cmp(&b.sales_amount))
        .collect()
}

/// The dimension value with the largest sum; ties resolve to the
/// lexicographically first name, empty input to the sentinel.
fn top_dimension(summary: &[DimensionTotal]) -> String {
    let mut top: Option<&DimensionTotal> = None;
    for entry in summary {
        let better = match top {
            None => true,
            Some(t) => {
                entry.sales_amount > t.sales_amount
                    || (entry.sales_amount == t.sales_amount && entry.name < t.name)
            }
        };
        if better {
            top = Some(entry);
        }
    }
    top.map(|t| t.name.clone())
        .unwrap_or_else(|| NO_DATA.to_string())
}

fn daily_series(rows: &[&SalesRecord]) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in rows {
        *by_day.entry(r.date).or_insert(0.0) += r.sales_amount;
    }
    by_day.into_iter().collect()
}

fn growth_rate(daily: &[(NaiveDate, f64)]) -> f64 {
    if daily.len() < 2 {
        return 0.0;
    }
    let first = daily[0].1;
    let last = daily[daily.len() - 1].1;
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}

fn moving_average(daily: &[(NaiveDate, f64)]) -> Vec<DailyPoint> {
    daily
        .iter()
        .enumerate()
        .map(|(i, &(date, sales_amount))| {
            let moving_average = if i + 1 < MOVING_AVERAGE_WINDOW {
                None
            } else {
                let window = &daily[i + 1 - MOVING_AVERAGE_WINDOW..=i];
                let sum: f64 = window.iter().map(|(_, v)| v).sum();
                Some(sum / MOVING_AVERAGE_WINDOW as f64)
            };
            DailyPoint {
                date,
                sales_amount,
                moving_average,
            }
        })
        .collect()
}
