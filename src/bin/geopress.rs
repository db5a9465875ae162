//! geopress: convert a location-history JSON export into a Parquet table.
//!
//! Usage:
//!   # Defaults: ./location-history.json -> ./location-history.parquet
//!   geopress
//!
//!   # Explicit paths
//!   geopress takeout/location-history.json -o history.parquet

// Use MiMalloc allocator for better performance on large exports
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use geopress::{convert, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "geopress")]
#[command(about = "Convert a location-history JSON export to a compressed Parquet table", long_about = None)]
struct Args {
    /// Input JSON file (top-level array of location-history records)
    #[arg(value_name = "FILE", default_value = "location-history.json")]
    input: PathBuf,

    /// Output Parquet file
    #[arg(long, short = 'o', default_value = "location-history.parquet")]
    output: PathBuf,

    /// Number of rows to show in the final preview (0 disables it)
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if !args.input.exists() {
        return Err(PipelineError::InputNotFound(args.input).into());
    }

    println!("Reading {} ...", args.input.display());
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let batch = convert(file, &args.output, |count| {
        println!("Processed {count} records...");
    })
    .context("Failed to process location history")?;

    println!(
        "Wrote {} records to {}",
        batch.num_rows(),
        args.output.display()
    );

    if args.preview > 0 {
        let sample = batch.slice(0, args.preview.min(batch.num_rows()));
        println!("\nSample of processed data:");
        println!("{}", pretty_format_batches(&[sample])?);
    }

    Ok(())
}
