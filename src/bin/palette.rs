use clap::Parser;
use std::fs;
use std::path::PathBuf;
use photo_palette_wasm::{ExtractOptions, PaletteExtractor};
use anyhow::Context;
use anyhow::Result;
use serde_json::json;

/// Extract the six dominant, vivid colors of each input image.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Seed for reproducible output (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Longest side of the working bitmap
    #[arg(short = 'm', long, default_value_t = 100)]
    max_dimension: u32,

    /// Number of k-means clusters before selection
    #[arg(short = 'k', long, default_value_t = 12)]
    clusters: usize,

    /// Maximum number of k-means iterations
    #[arg(short, long, default_value_t = 25)]
    iterations: usize,

    /// Print a JSON array instead of one line per image
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let extractor = PaletteExtractor::new(ExtractOptions {
        max_dimension: args.max_dimension,
        cluster_count: args.clusters,
        max_iterations: args.iterations,
        seed: args.seed,
    });

    let mut results = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let colors = extractor.extract_bytes(&bytes);

        if args.json {
            results.push(json!({ "path": input.display().to_string(), "colors": colors }));
        } else {
            println!("{}: {}", input.display(), colors.join(" "));
        }
    }

    if args.json {
        let out = serde_json::to_string_pretty(&results).context("serializing palettes")?;
        println!("{out}");
    }

    Ok(())
}
