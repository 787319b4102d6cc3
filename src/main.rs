// src/main.rs
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crash_clustering_lib::analysis::hierarchical::Linkage;
use crash_clustering_lib::models::analysis::{AnalysisRequest, AnalysisResult};
use crash_clustering_lib::service::{AnalysisError, ClusteringService};
use crash_clustering_lib::utils::config::AnalysisConfig;
use crash_clustering_lib::utils::constants::{DEFAULT_DISTANCE_THRESHOLD, DEFAULT_SAMPLE_SIZE};
use crash_clustering_lib::utils::env::{load_env, EnvSource};
use crash_clustering_lib::utils::get_memory_usage;
use crash_clustering_lib::utils::progress_bars::progress_config::ProgressConfig;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Crash dataset CSV (overrides CRASH_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Linkage criterion (overrides CLUSTER_LINKAGE)
    #[arg(long, global = true, value_enum)]
    linkage: Option<Linkage>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the selectable regions and how many records each has
    Regions,

    /// Cluster a sample of one region's crashes
    Analyze {
        /// Two-letter region code, e.g. CA
        #[arg(long)]
        state: String,

        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        sample_size: usize,

        #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD)]
        distance_threshold: f64,

        /// Seed the sampler for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Write the JSON result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Analyze several regions concurrently with the same parameters
    Batch {
        /// Comma-separated region codes, e.g. CA,TX,FL
        #[arg(long, value_delimiter = ',', required = true)]
        states: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        sample_size: usize,

        #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD)]
        distance_threshold: f64,

        /// Also write one `<STATE>.json` per region into this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment first so RUST_LOG from .env reaches the logger
    let env_source = load_env();
    env_logger::init();
    match env_source {
        Ok(EnvSource::File(path)) => info!("Loaded environment variables from {}", path.display()),
        Ok(EnvSource::System) => info!("No .env file found, using environment variables from system"),
        Err(e) => warn!("{:#}", e),
    }
    let cli = Cli::parse();

    let mut config = AnalysisConfig::from_env();
    if let Some(path) = cli.data {
        config.data_path = path;
    }
    if let Some(linkage) = cli.linkage {
        config.linkage = linkage;
    }
    config.log_config();

    let progress_config = ProgressConfig::from_env();
    let service = load_service(config, &progress_config)?;

    match cli.command {
        Command::Regions => {
            let listing: Vec<serde_json::Value> = service
                .region_counts()
                .into_iter()
                .map(|(region, count)| {
                    json!({ "abbr": region.code, "name": region.name, "records": count })
                })
                .collect();
            let out = serde_json::to_string_pretty(&listing)
                .context("Failed to serialize region list")?;
            println!("{}", out);
        }
        Command::Analyze {
            state,
            sample_size,
            distance_threshold,
            seed,
            output,
            pretty,
        } => {
            let request = AnalysisRequest::new(state, sample_size, distance_threshold);
            let start = Instant::now();
            let outcome = match seed {
                Some(seed) => service.analyze_with_rng(&request, &mut StdRng::seed_from_u64(seed)),
                None => service.analyze(&request),
            };
            let result = exit_on_invalid(outcome)?;
            info!("Analysis for {} finished in {:.2?}", request.state, start.elapsed());
            write_result(&result, output.as_ref(), pretty)?;
        }
        Command::Batch {
            states,
            sample_size,
            distance_threshold,
            output_dir,
            pretty,
        } => {
            let requests: Vec<AnalysisRequest> = states
                .iter()
                .map(|state| AnalysisRequest::new(state.trim(), sample_size, distance_threshold))
                .collect();
            let start = Instant::now();
            let results = service.analyze_batch(requests).await;

            if let Some(dir) = &output_dir {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }

            let mut failures = 0;
            for (state, outcome) in states.iter().zip(results) {
                match outcome {
                    Ok(result) => {
                        if result.is_empty() {
                            warn!("⚠️ No records for {}", result.run_info.region);
                        }
                        println!(
                            "{}\tclusters={}\tsample={}",
                            result.run_info.region,
                            result.n_clusters,
                            result.run_info.effective_sample_size
                        );
                        if let Some(dir) = &output_dir {
                            let path = dir.join(format!("{}.json", result.run_info.region));
                            write_result(&result, Some(&path), pretty)?;
                        }
                    }
                    Err(e) => {
                        error!("❌ Analysis for {} failed: {}", state, e);
                        failures += 1;
                    }
                }
            }
            println!("elapsed={:.2?}", start.elapsed());
            if failures > 0 {
                bail!("{} of {} analyses failed", failures, states.len());
            }
        }
    }

    Ok(())
}

fn load_service(config: AnalysisConfig, progress_config: &ProgressConfig) -> Result<ClusteringService> {
    let multi_progress = progress_config.create_multi_progress();
    let spinner = progress_config.add_spinner(
        multi_progress.as_ref(),
        &format!("Loading {}...", config.data_path.display()),
    );

    let start = Instant::now();
    let service = ClusteringService::load(config)?;
    let dataset = service.dataset();

    if let Some(pb) = &spinner {
        pb.finish_with_message(format!("Loaded {} records", dataset.len()));
    }
    if dataset.is_empty() {
        warn!("⚠️ Dataset has no records; every analysis will be empty");
    }
    info!(
        "📂 Loaded {} records across {} regions from {} in {:.2?}",
        dataset.len(),
        dataset.region_count(),
        service.config().data_path.display(),
        start.elapsed()
    );
    if progress_config.should_show_memory() {
        info!("Memory after load: {} MB", get_memory_usage());
    }

    Ok(service)
}

/// Validation failures are the caller's fault: report them and exit with status 2.
fn exit_on_invalid(outcome: std::result::Result<AnalysisResult, AnalysisError>) -> Result<AnalysisResult> {
    match outcome {
        Ok(result) => Ok(result),
        Err(e) if e.is_invalid() => {
            error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

fn write_result(result: &AnalysisResult, path: Option<&PathBuf>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .context("Failed to serialize analysis result")?;

    match path {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write result to {}", path.display()))?;
            info!("💾 Wrote result for {} to {}", result.run_info.region, path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
