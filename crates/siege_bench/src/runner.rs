use crate::run_result::{self, RunResult, SummaryMetrics};
use anyhow::{Context, Result};
use siege_control::{AutopilotConfig, AutopilotController, CommandSource};
use siege_core::{Difficulty, Event, EventEnvelope, GameContent, MetricsSnapshot};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

pub struct DifficultyResult {
    pub difficulty: Difficulty,
    pub final_snapshot: MetricsSnapshot,
    pub outcome: run_result::Outcome,
    pub run_id: String,
}

pub struct RunSpec<'a> {
    pub cycles: u64,
    pub metrics_every: u64,
    pub autopilot: &'a AutopilotConfig,
    pub scenario_name: &'a str,
    pub scenario_params: &'a serde_json::Value,
}

#[derive(Default)]
struct Milestones {
    first_research_cycle: Option<u64>,
    ignition_cycle: Option<u64>,
}

impl Milestones {
    fn observe(&mut self, events: &[EventEnvelope]) {
        for envelope in events {
            match envelope.event {
                Event::ResearchCompleted { .. } if self.first_research_cycle.is_none() => {
                    self.first_research_cycle = Some(envelope.cycle);
                }
                Event::CoreIgnited => self.ignition_cycle = Some(envelope.cycle),
                _ => {}
            }
        }
    }
}

/// Play one autopilot game at `difficulty`, writing run info, metrics and the
/// run result into `run_dir`.
pub fn run_difficulty(
    content: &GameContent,
    difficulty: Difficulty,
    spec: &RunSpec<'_>,
    run_dir: &Path,
) -> Result<DifficultyResult> {
    let run_id = Uuid::new_v4().to_string();
    let start = Instant::now();

    let mut state = siege_world::build_initial_state(content, difficulty);
    let cycle_start = state.cycle;
    let mut autopilot = AutopilotController::new(spec.autopilot.clone());
    let mut milestones = Milestones::default();

    std::fs::create_dir_all(run_dir)
        .with_context(|| format!("creating run directory: {}", run_dir.display()))?;
    siege_world::write_run_info(
        run_dir,
        &run_id,
        difficulty,
        &content.content_version,
        serde_json::json!({
            "runner": "siege_bench",
            "cycles": spec.cycles,
            "metrics_every": spec.metrics_every,
        }),
    )?;
    let mut metrics_writer = siege_world::MetricsFileWriter::new(run_dir.to_path_buf())
        .with_context(|| format!("opening metrics CSV in {}", run_dir.display()))?;

    let metrics_every = spec.metrics_every.max(1);
    let mut played = 0;
    while played < spec.cycles && !state.game_over {
        for command in autopilot.generate_commands(&state, content) {
            let transition = siege_core::apply_command(&state, &command, content);
            milestones.observe(&transition.events);
            state = transition.state;
        }
        let transition = siege_core::advance_cycle(&state, content);
        milestones.observe(&transition.events);
        state = transition.state;
        played += 1;

        if played % metrics_every == 0 {
            let snapshot = siege_core::compute_metrics(&state, &content.constants);
            metrics_writer
                .write_row(&snapshot)
                .context("writing metrics row")?;
        }
    }

    // Always capture final snapshot
    let final_snapshot = siege_core::compute_metrics(&state, &content.constants);
    if played % metrics_every != 0 {
        metrics_writer
            .write_row(&final_snapshot)
            .context("writing final metrics row")?;
    }
    metrics_writer.flush().context("flushing metrics")?;

    #[allow(clippy::cast_possible_truncation)]
    let wall_time_ms = start.elapsed().as_millis() as u64;
    let outcome = run_result::outcome_of(&final_snapshot);
    tracing::info!(%difficulty, ?outcome, cycle = state.cycle, wall_time_ms, "run finished");

    let result = RunResult {
        run_schema_version: 1,
        run_status: "completed".to_string(),
        run_id: run_id.clone(),
        git_sha: run_result::git_sha(),
        git_dirty: run_result::git_dirty(),
        difficulty,
        scenario_name: spec.scenario_name.to_string(),
        scenario_params: spec.scenario_params.clone(),
        cycle_start,
        cycle_end: state.cycle,
        total_cycles: played,
        wall_time_ms,
        outcome,
        defeat_cause: siege_core::defeat_cause(&state),
        first_research_cycle: milestones.first_research_cycle,
        ignition_cycle: milestones.ignition_cycle,
        summary_metrics: Some(SummaryMetrics::from_snapshot(&final_snapshot)),
        metrics_path: "metrics_000.csv".to_string(),
    };
    result
        .write_atomic(&run_dir.join("run_result.json"))
        .context("writing run_result.json")?;

    Ok(DifficultyResult {
        difficulty,
        final_snapshot,
        outcome,
        run_id,
    })
}
