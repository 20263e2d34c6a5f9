use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use sales_analytics::engine::QueryEngine;
use sales_analytics::filter::FilterParams;
use sales_analytics::ingestion;

#[derive(Parser)]
#[command(name = "sales-analytics")]
#[command(about = "Sales analytics query engine over CSV exports")]
struct Args {
    /// Directory containing sales.csv, products.csv, customers.csv
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Start of the date range (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// End of the date range (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Region to include (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Category to include (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Exact product name
    #[arg(long)]
    product: Option<String>,

    /// Free-text search over product names and customer ids
    #[arg(long)]
    search: Option<String>,

    /// Minimum sales amount
    #[arg(long)]
    min_amount: Option<f64>,

    /// Maximum sales amount
    #[arg(long)]
    max_amount: Option<f64>,

    /// Also print a year-over-year summary for this reference year
    #[arg(long)]
    yoy_year: Option<i32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Loading data from {}", args.data_dir.display());
    let (sales, products, customers) = ingestion::load_data_dir(&args.data_dir)?;
    let engine = QueryEngine::load(&sales, &products, &customers)?;

    let params = FilterParams {
        start_date: args.start_date,
        end_date: args.end_date,
        regions: args.regions,
        categories: args.categories,
        product: args.product,
        search: args.search,
        min_amount: args.min_amount,
        max_amount: args.max_amount,
    };
    let spec = params.into_spec()?;

    let metrics = engine.query(&spec);
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    if let Some(year) = args.yoy_year {
        let yoy = engine.year_over_year(&spec, year);
        println!("{}", serde_json::to_string_pretty(&yoy)?);
    }

    Ok(())
}
