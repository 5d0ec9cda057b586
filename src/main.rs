use clap::Parser;
use community_detector::cluster::metrics::PartitionQuality;
use community_detector::{pipeline, storage, Config, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "community-detector",
    about = "Louvain communities of a thresholded user-user similarity matrix"
)]
struct Cli {
    /// Path to the sparse matrix (.npz)
    #[clap(long, default_value = "sparse_matrix.npz")]
    input: PathBuf,

    /// Output CSV, one community per row
    #[clap(long, default_value = "communities.csv")]
    output: PathBuf,

    /// Minimum similarity weight for an edge to be retained
    #[clap(long, default_value = "7")]
    threshold: f64,

    /// Louvain resolution (higher = smaller communities)
    #[clap(long, default_value = "1.0")]
    resolution: f64,

    /// Communities below this size count as small in the summary
    #[clap(long, default_value = "50")]
    small_community_size: usize,

    /// Write a JSON run summary to this path
    #[clap(long)]
    summary: Option<PathBuf>,

    /// Comma-separated thresholds to evaluate after the main run
    #[clap(long, value_delimiter = ',')]
    sweep: Vec<f64>,

    /// Where to write the sweep report
    #[clap(long, default_value = "threshold_sweep.json")]
    sweep_output: PathBuf,

    /// Number of worker threads for the sweep (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = Config {
        small_community_size: args.small_community_size,
        ..Config::new(args.threshold, args.resolution)
    };

    log::info!("Starting community detection");
    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output.display());

    // 1-4. Load, filter, build, detect and write
    let (matrix, detection) = pipeline::run(&args.input, &args.output, &config)?;

    log::info!(
        "Wrote {} communities covering {} nodes",
        detection.partition.len(),
        detection.partition.node_count()
    );

    // 5. Optional diagnostics
    if let Some(summary_path) = &args.summary {
        let quality = PartitionQuality::evaluate(&detection.graph, &detection.partition, &config);
        storage::save_summary(&matrix, &detection, &quality, summary_path)?;
    }

    if !args.sweep.is_empty() {
        // Set number of threads
        let num_threads = if args.threads > 0 {
            args.threads
        } else {
            // If threads = 0, use all available cores
            num_cpus::get()
        };

        log::info!("Using {} worker threads", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;

        let points = pipeline::sweep(&matrix, &args.sweep, &config)?;
        storage::save_sweep(&points, &args.sweep_output)?;
    }

    log::info!("Analysis complete. Results saved to {}", args.output.display());

    Ok(())
}
