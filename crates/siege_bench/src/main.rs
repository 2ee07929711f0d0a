use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod overrides;
mod run_result;
mod runner;
mod scenario;
mod summary;

#[derive(Parser)]
#[command(name = "siege_bench", about = "Autopilot balance sweeps across difficulties")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file once per listed difficulty.
    Run {
        /// Path to the scenario JSON file.
        #[arg(long)]
        scenario: String,
        /// Output directory (default: runs/).
        #[arg(long, default_value = "runs")]
        output_dir: String,
    },
}

fn write_batch_summary(path: &Path, batch_summary: &serde_json::Value) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(batch_summary).context("serializing batch summary")?;
    let mut file =
        std::fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    file.write_all(json.as_bytes())
        .context("writing batch summary")?;
    file.sync_all()?;
    std::fs::rename(&tmp, path).context("renaming batch summary")?;
    Ok(())
}

fn run(scenario_path: &str, output_dir: &str) -> Result<()> {
    let scenario = scenario::load_scenario(Path::new(scenario_path))?;
    println!(
        "Loading scenario '{}': {} difficulties × {} cycles",
        scenario.name,
        scenario.difficulties.len(),
        scenario.cycles
    );

    let mut content = siege_world::load_content(&scenario.content_dir)?;
    overrides::apply_overrides(&mut content.constants, &scenario.overrides)?;
    siege_world::validate_content(&content).context("content invalid after overrides")?;

    let scenario_params = serde_json::json!({
        "cycles": scenario.cycles,
        "metrics_every": scenario.metrics_every,
        "content_dir": scenario.content_dir,
        "overrides": scenario.overrides,
        "autopilot": scenario.autopilot,
    });

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let batch_dir = PathBuf::from(output_dir).join(format!("{}_{}", scenario.name, timestamp));
    std::fs::create_dir_all(&batch_dir)
        .with_context(|| format!("creating output directory: {}", batch_dir.display()))?;
    std::fs::copy(scenario_path, batch_dir.join("scenario.json"))
        .context("copying scenario file")?;

    println!("Output: {}", batch_dir.display());
    println!("Running {} games in parallel...", scenario.difficulties.len());

    let spec = runner::RunSpec {
        cycles: scenario.cycles,
        metrics_every: scenario.metrics_every,
        autopilot: &scenario.autopilot,
        scenario_name: &scenario.name,
        scenario_params: &scenario_params,
    };
    let results: Vec<Result<runner::DifficultyResult>> = scenario
        .difficulties
        .par_iter()
        .map(|&difficulty| {
            let run_dir = batch_dir.join(difficulty.as_str().to_ascii_lowercase());
            runner::run_difficulty(&content, difficulty, &spec, &run_dir)
        })
        .collect();

    let mut finished = Vec::new();
    for result in results {
        match result {
            Ok(result) => finished.push(result),
            Err(err) => eprintln!("Run failed: {err:#}"),
        }
    }
    if finished.is_empty() {
        anyhow::bail!("all runs failed");
    }

    let stats = summary::compute_summary(&finished);
    summary::print_summary(&scenario.name, scenario.cycles, &finished, &stats);

    let outcomes: serde_json::Map<String, serde_json::Value> = finished
        .iter()
        .map(|r| (r.difficulty.as_str().to_string(), serde_json::json!(r.outcome)))
        .collect();
    let run_ids: Vec<&str> = finished.iter().map(|r| r.run_id.as_str()).collect();
    let batch_summary = serde_json::json!({
        "batch_schema_version": 1,
        "batch_id": Uuid::new_v4().to_string(),
        "scenario_name": scenario.name,
        "scenario_params": scenario_params,
        "run_ids": run_ids,
        "outcomes": outcomes,
        "summary": stats,
    });
    let batch_path = batch_dir.join("batch_summary.json");
    write_batch_summary(&batch_path, &batch_summary)?;

    println!("Batch summary written to {}", batch_path.display());
    Ok(())
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            output_dir,
        } => run(&scenario, &output_dir)?,
    }
    Ok(())
}
