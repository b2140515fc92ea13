use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod clean;
mod dataset;
mod error;
mod metrics;
mod models;
mod report;

use clean::FillPolicy;

#[derive(Parser)]
#[command(name = "sales-clean")]
#[command(about = "Clean a messy sales CSV and summarize what sold", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct RunArgs {
    /// Raw sales CSV to clean
    #[arg(long, env = "SALES_CLEAN_INPUT", default_value = "messy_sales_data.csv")]
    input: PathBuf,
    /// Where the cleaned CSV is written (overwritten if present)
    #[arg(long, env = "SALES_CLEAN_OUTPUT", default_value = "cleaned_sales_data.csv")]
    output: PathBuf,
    /// How missing or malformed quantities and prices are resolved
    #[arg(long, env = "SALES_CLEAN_FILL", value_enum, default_value_t = FillPolicy::Zero)]
    fill: FillPolicy,
}

#[derive(Subcommand)]
enum Commands {
    /// Print summary metrics for an already cleaned CSV
    Metrics {
        #[arg(long, default_value = "cleaned_sales_data.csv")]
        cleaned: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown sales report from a cleaned CSV
    Report {
        #[arg(long, default_value = "cleaned_sales_data.csv")]
        cleaned: PathBuf,
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only include this product (repeatable; matched after name cleanup)
        #[arg(long = "product")]
        products: Vec<String>,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        None => run(&cli.run)?,
        Some(Commands::Metrics { cleaned, json }) => {
            let records = dataset::load_cleaned(&cleaned)
                .with_context(|| format!("could not load cleaned data from {}", cleaned.display()))?;
            let summary = metrics::summarize(&records);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Total quantity: {}", summary.total_quantity);
                println!("Total revenue: {:.2}", summary.total_revenue);
                println!("Unique products: {}", summary.unique_products);
            }
        }
        Some(Commands::Report {
            cleaned,
            from,
            to,
            products,
            top,
            out,
        }) => {
            if let (Some(from), Some(to)) = (from, to) {
                anyhow::ensure!(from <= to, "--from {from} is after --to {to}");
            }
            let records = dataset::load_cleaned(&cleaned)
                .with_context(|| format!("could not load cleaned data from {}", cleaned.display()))?;
            let report = report::build_report(&records, from, to, &products, top);
            std::fs::write(&out, report)
                .with_context(|| format!("could not write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let raw = dataset::load(&args.input)
        .with_context(|| format!("could not load sales data from {}", args.input.display()))?;
    let (cleaned, cleaning) = clean::clean(&raw, args.fill);
    let summary = metrics::summarize(&cleaned);

    dataset::persist(&cleaned, &args.output)
        .with_context(|| format!("could not save cleaned data to {}", args.output.display()))?;

    println!(
        "Cleaned {} of {} rows into {}.",
        cleaning.rows_kept,
        cleaning.rows_read,
        args.output.display()
    );
    println!(
        "Dropped: {} missing product, {} bad date, {} missing numbers, {} duplicates.",
        cleaning.dropped_missing_product,
        cleaning.dropped_bad_date,
        cleaning.dropped_missing_numeric,
        cleaning.duplicates_removed
    );
    if cleaning.coercion_warnings() > 0 {
        println!(
            "Coercion warnings: {} quantity, {} price ({:?} policy).",
            cleaning.quantity_warnings, cleaning.price_warnings, args.fill
        );
    }
    println!("Total quantity: {}", summary.total_quantity);
    println!("Total revenue: {:.2}", summary.total_revenue);
    println!("Unique products: {}", summary.unique_products);

    let top = metrics::top_products(&cleaned, 5);
    if !top.is_empty() {
        println!("Top {} products by quantity:", top.len());
        for product in top.iter() {
            println!("- {}: {}", product.product, product.quantity);
        }
    }

    Ok(())
}
