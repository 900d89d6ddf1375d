use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::{anyhow, Result};
use clap::Parser;

use city_traffic::config::Config;
use city_traffic::data::cases::run_reference_cases;
use city_traffic::graph::builder::parse_description_file;
use city_traffic::storage;
use city_traffic::traffic::TrafficAnalyzer;

#[derive(Parser, Debug)]
#[clap(
    name = "city-traffic-analyzer",
    about = "Maximum traffic per city over a tree of cities"
)]
struct Cli {
    /// Path to a file with one `id:[n1,n2,...]` description per line
    #[clap(long)]
    input: Option<PathBuf>,

    /// Output directory for JSON results
    #[clap(long)]
    output_dir: Option<PathBuf>,

    /// Run the built-in reference cases and report CORRECT/WRONG per case
    #[clap(long)]
    self_check: bool,

    /// Evaluate roots in parallel over a shared cache
    #[clap(long)]
    parallel: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Fail instead of warning when the input is not a tree
    #[clap(long)]
    strict: bool,

    /// Accept 0 as a city id
    #[clap(long)]
    allow_zero_id: bool,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
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

    let config = Config::new(args.parallel, args.threads, args.strict, !args.allow_zero_id);

    if config.parallel {
        log::info!("Using {} worker threads", config.worker_threads());
    }

    if args.self_check {
        return self_check(&config);
    }

    let input = args
        .input
        .ok_or_else(|| anyhow!("either --input or --self-check is required"))?;

    // 1. Load city map
    let city_map = parse_description_file(&input, config.reserve_zero_id)?;

    // 2. Compute traffic for every city
    let mut analyzer = TrafficAnalyzer::with_city_map(city_map, config);
    let traffic_result = analyzer.compute_overall_traffic()?;

    println!("{}", storage::serialize_traffic_result(&traffic_result));

    // 3. Save results if requested
    if let Some(output_dir) = args.output_dir {
        storage::save_results(
            &traffic_result,
            analyzer.city_map(),
            analyzer.last_stats(),
            &output_dir,
        )?;
    }

    Ok(ExitCode::SUCCESS)
}

fn self_check(config: &Config) -> Result<ExitCode> {
    let outcomes = run_reference_cases(config)?;

    println!();
    for outcome in &outcomes {
        println!("{}\n", outcome.verdict());
    }

    let failed = outcomes.iter().filter(|outcome| !outcome.is_correct()).count();
    if failed > 0 {
        log::error!("{} of {} reference cases failed", failed, outcomes.len());
        return Ok(ExitCode::FAILURE);
    }

    log::info!("All {} reference cases passed", outcomes.len());
    Ok(ExitCode::SUCCESS)
}
