use crate::run_result::Outcome;
use crate::runner::DifficultyResult;
use serde::Serialize;
use siege_core::MetricsSnapshot;

type Extractor = (&'static str, fn(&MetricsSnapshot) -> f64);

const EXTRACTORS: &[Extractor] = &[
    ("cycle", |s| s.cycle as f64),
    ("population_total", |s| s.population_total),
    ("soldiers", |s| f64::from(s.soldiers)),
    ("food", |s| s.food),
    ("shards", |s| s.shards),
    ("structure_health", |s| s.structure_health),
    ("threat_strength", |s| s.threat_strength),
    ("defense_power", |s| s.defense_power),
    ("techs_unlocked", |s| f64::from(s.techs_unlocked)),
    ("hero_level", |s| f64::from(s.hero_level)),
];

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub run_count: usize,
    pub victory_count: usize,
    pub defeat_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

pub fn compute_summary(results: &[DifficultyResult]) -> SummaryStats {
    let count_of = |outcome| results.iter().filter(|r| r.outcome == outcome).count();
    let metrics = EXTRACTORS
        .iter()
        .map(|(name, extract)| {
            let values: Vec<f64> = results.iter().map(|r| extract(&r.final_snapshot)).collect();
            compute_metric_summary(name, &values)
        })
        .collect();

    SummaryStats {
        run_count: results.len(),
        victory_count: count_of(Outcome::Victory),
        defeat_count: count_of(Outcome::Defeat),
        metrics,
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev: variance.sqrt(),
    }
}

pub fn print_summary(
    scenario_name: &str,
    cycles: u64,
    results: &[DifficultyResult],
    stats: &SummaryStats,
) {
    println!();
    println!("=== Scenario '{scenario_name}' ({cycles} cycle budget) ===");
    println!(
        "{:<12} {:>8} {:>7} {:>7} {:>8} {:>6}",
        "difficulty", "outcome", "cycle", "pop", "threat", "techs"
    );
    for r in results {
        let s = &r.final_snapshot;
        println!(
            "{:<12} {:>8} {:>7} {:>7.1} {:>8.1} {:>6}",
            r.difficulty.as_str(),
            format!("{:?}", r.outcome).to_ascii_lowercase(),
            s.cycle,
            s.population_total,
            s.threat_strength,
            s.techs_unlocked,
        );
    }
    println!();
    println!(
        "{} runs: {} victories, {} defeats",
        stats.run_count, stats.victory_count, stats.defeat_count
    );
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10}",
        "metric", "mean", "min", "max", "stddev"
    );
    for m in &stats.metrics {
        println!(
            "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            m.name, m.mean, m.min, m.max, m.stddev
        );
    }
}
