use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use siege_control::{AutopilotController, CommandSource};
use siege_core::{
    advance_cycle, apply_command, compute_metrics, defeat_cause, defense_power,
    recent_notifications, research_eta, AllocationPolicy, Command, Constants, DefeatCause,
    DefenseStance, Difficulty, Event, EventEnvelope, GameContent, GameState, HeroStatus, TechId,
};
use siege_world::{build_initial_state, load_content, write_run_info, MetricsFileWriter, SaveStore};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "siege_cli", about = "Fortress Siege CLI")]
struct Cli {
    #[arg(long, global = true, default_value = "./content")]
    content_dir: String,
    /// Directory holding the single save slot.
    #[arg(long, global = true, default_value = "./saves")]
    save_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game, replacing any existing save.
    New {
        #[arg(long, default_value = "veteran")]
        difficulty: Difficulty,
    },
    /// Print the saved game.
    Status,
    /// Resolve one or more cycles.
    Advance {
        #[arg(long, default_value_t = 1)]
        cycles: u32,
    },
    /// Set the allocation policy in percent; scientists take the remainder.
    Allocate {
        farmers: u32,
        miners: u32,
        soldiers: u32,
    },
    /// Set the defense stance (standard, fortify, sally-forth).
    Stance { stance: DefenseStance },
    /// Start researching a tech (e.g. crop-rotation).
    Research { tech: TechId },
    /// Spend shards to drive the horde back.
    Banish,
    /// Begin the final stand.
    Ignite,
    /// Let the autopilot play a fresh game headless.
    Run {
        #[arg(long, default_value_t = 200)]
        cycles: u64,
        #[arg(long, default_value = "veteran")]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 10)]
        print_every: u64,
        /// Sample metrics every N cycles.
        #[arg(long, default_value_t = 1)]
        metrics_every: u64,
        /// Disable automatic metrics collection to runs/ directory.
        #[arg(long)]
        no_metrics: bool,
    },
}

// ---------------------------------------------------------------------------
// Save-slot play
// ---------------------------------------------------------------------------

fn load_game(store: &SaveStore) -> Result<GameState> {
    store.load().with_context(|| {
        format!(
            "no saved game in {}; start one with `siege_cli new`",
            store.path().display()
        )
    })
}

fn new_game(content_dir: &str, save_dir: &Path, difficulty: Difficulty) -> Result<()> {
    let content = load_content(content_dir)?;
    let store = SaveStore::new(save_dir);
    store.clear();
    let state = build_initial_state(&content, difficulty);
    store.save(&state);
    print_status(&state, &content.constants);
    Ok(())
}

fn show_status(content_dir: &str, save_dir: &Path) -> Result<()> {
    let content = load_content(content_dir)?;
    let state = load_game(&SaveStore::new(save_dir))?;
    print_status(&state, &content.constants);
    Ok(())
}

fn play_command(content_dir: &str, save_dir: &Path, command: &Command) -> Result<()> {
    let content = load_content(content_dir)?;
    let store = SaveStore::new(save_dir);
    let state = load_game(&store)?;

    let transition = apply_command(&state, command, &content);
    if transition.state == state {
        println!("Nothing happened. {}", no_op_hint(&state, command));
        return Ok(());
    }
    print_events(&transition.events);
    store.save(&transition.state);
    print_status(&transition.state, &content.constants);
    Ok(())
}

fn advance(content_dir: &str, save_dir: &Path, cycles: u32) -> Result<()> {
    let content = load_content(content_dir)?;
    let store = SaveStore::new(save_dir);
    let mut state = load_game(&store)?;

    for _ in 0..cycles {
        if state.game_over {
            break;
        }
        let transition = advance_cycle(&state, &content);
        print_events(&transition.events);
        state = transition.state;
    }
    store.save(&state);
    print_status(&state, &content.constants);
    Ok(())
}

fn no_op_hint(state: &GameState, command: &Command) -> &'static str {
    if state.game_over {
        return "The game is over; start a new one with `siege_cli new`.";
    }
    match command {
        Command::StartResearch { .. } => "That tech is already known or being researched.",
        Command::BanishThreat => "Not enough shards.",
        Command::IgniteCore => "Ignition needs Core Stabilization and enough shards.",
        Command::SetAllocation { .. } | Command::SetStance { .. } => {
            "That is already the current setting."
        }
    }
}

// ---------------------------------------------------------------------------
// Autopilot run loop
// ---------------------------------------------------------------------------

fn generate_run_id(difficulty: Difficulty) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!("{stamp}_{}", difficulty.as_str().to_ascii_lowercase())
}

fn create_run_dir(run_id: &str) -> Result<PathBuf> {
    let dir = PathBuf::from("runs").join(run_id);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating run directory: {}", dir.display()))?;
    Ok(dir)
}

struct RunOptions {
    cycles: u64,
    difficulty: Difficulty,
    print_every: u64,
    metrics_every: u64,
    no_metrics: bool,
}

fn open_metrics(content: &GameContent, options: &RunOptions) -> Result<Option<MetricsFileWriter>> {
    if options.no_metrics {
        return Ok(None);
    }
    let run_id = generate_run_id(options.difficulty);
    let run_dir = create_run_dir(&run_id)?;
    write_run_info(
        &run_dir,
        &run_id,
        options.difficulty,
        &content.content_version,
        serde_json::json!({
            "runner": "siege_cli",
            "cycles": options.cycles,
            "print_every": options.print_every,
            "metrics_every": options.metrics_every,
        }),
    )?;
    let writer = MetricsFileWriter::new(run_dir.clone())
        .with_context(|| format!("opening metrics CSV in {}", run_dir.display()))?;
    println!("Run directory: {}", run_dir.display());
    Ok(Some(writer))
}

fn run(content_dir: &str, options: &RunOptions) -> Result<()> {
    let content = load_content(content_dir)?;
    let mut state = build_initial_state(&content, options.difficulty);
    let mut metrics_writer = open_metrics(&content, options)?;
    let mut autopilot = AutopilotController::default();
    let print_every = options.print_every.max(1);
    let metrics_every = options.metrics_every.max(1);

    println!(
        "Starting siege: cycles={} difficulty={} content_version={}",
        options.cycles, options.difficulty, content.content_version,
    );
    println!("{}", "-".repeat(80));

    for _ in 0..options.cycles {
        if state.game_over {
            break;
        }
        for command in autopilot.generate_commands(&state, &content) {
            let transition = apply_command(&state, &command, &content);
            print_milestones(&transition.events);
            state = transition.state;
        }
        let transition = advance_cycle(&state, &content);
        print_milestones(&transition.events);
        state = transition.state;

        // `cycle` already points at the next unresolved cycle.
        let resolved = state.cycle - 1;
        if resolved % print_every == 0 {
            print_status(&state, &content.constants);
        }
        if let Some(ref mut writer) = metrics_writer {
            if resolved % metrics_every == 0 || state.game_over {
                let snapshot = compute_metrics(&state, &content.constants);
                writer.write_row(&snapshot).context("writing metrics row")?;
            }
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state at cycle {}:", state.cycle);
    print_status(&state, &content.constants);

    if let Some(ref mut writer) = metrics_writer {
        writer.flush().context("final metrics flush")?;
        println!("Metrics written to runs/ directory.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::CycleAdvanced => return None,
        Event::AttackRepelled => "The attack was repelled.".to_string(),
        Event::WallsDamaged { damage } => format!("The walls took {damage:.0} damage."),
        Event::SallyCasualties { lost } => format!("{lost} soldiers fell during the sally."),
        Event::HeroLeveledUp { level } => format!("The hero reached level {level}."),
        Event::ResearchStarted { tech_id } => format!("Research started: {tech_id}."),
        Event::ResearchCompleted { tech_id } => format!("*** RESEARCH COMPLETE: {tech_id} ***"),
        Event::ThreatBanished { remaining } => format!("Threat banished; {remaining:.1} remain."),
        Event::CoreIgnited => "*** THE CORE IS IGNITING ***".to_string(),
        Event::FinalStandTick { turns_remaining } => {
            format!("Core ignition: {turns_remaining} cycles remaining.")
        }
        Event::Defeat { cause } => format!("*** DEFEAT: {} ***", cause_text(*cause)),
        Event::Victory => "*** VICTORY ***".to_string(),
    };
    Some(line)
}

fn print_events(events: &[EventEnvelope]) {
    for envelope in events {
        if let Some(line) = describe(&envelope.event) {
            println!("  [cycle={:04}] {line}", envelope.cycle);
        }
    }
}

/// Only the events worth interrupting an autopilot run for.
fn print_milestones(events: &[EventEnvelope]) {
    for envelope in events {
        let notable = matches!(
            envelope.event,
            Event::ResearchCompleted { .. }
                | Event::CoreIgnited
                | Event::Defeat { .. }
                | Event::Victory
        );
        if notable {
            if let Some(line) = describe(&envelope.event) {
                println!("{line} at cycle={:04}", envelope.cycle);
            }
        }
    }
}

fn cause_text(cause: DefeatCause) -> &'static str {
    match cause {
        DefeatCause::WallsFallen => "the walls have fallen",
        DefeatCause::Extinction => "everyone is dead",
    }
}

fn research_line(state: &GameState, constants: &Constants) -> String {
    let Some(tech_id) = state.active_research_id else {
        return "idle".to_string();
    };
    let Some(tech) = state.techs.get(&tech_id) else {
        return "idle".to_string();
    };
    let progress = state.research_progress.get(&tech_id).copied().unwrap_or(0.0);
    let eta = research_eta(state, constants)
        .map_or_else(|| "stalled".to_string(), |n| format!("eta {n}"));
    format!("{} {progress:.0}/{:.0} ({eta})", tech.name, tech.cost)
}

fn print_status(state: &GameState, constants: &Constants) {
    let pop = &state.population;
    let unlocked = state.techs.values().filter(|t| t.unlocked).count();
    let hero = match state.hero.status {
        HeroStatus::Ready => "ready".to_string(),
        HeroStatus::Recovering => format!("recovering {}", state.hero.cooldown),
    };

    println!(
        "[cycle={:04}  {}  {}]  pop={:.1} (farm={} mine={} sol={} sci={})  \
         food={:.1}  shards={:.1}",
        state.cycle,
        state.difficulty,
        state.stance,
        pop.total,
        pop.farmers,
        pop.miners,
        pop.soldiers,
        pop.scientists,
        state.resources.food,
        state.resources.shards,
    );
    println!(
        "    walls={:.0}/{:.0}  defense={:.0}  hero=lvl{} ({hero})  techs={unlocked}/{}  research={}",
        state.structure_health,
        state.max_structure_health,
        defense_power(state, constants),
        state.hero.level,
        state.techs.len(),
        research_line(state, constants),
    );
    println!("    {}", state.scout_report);
    if state.final_stand.active && !state.game_over {
        println!(
            "    FINAL STAND: {} cycles until ignition",
            state.final_stand.turns_remaining
        );
    }
    for notification in recent_notifications(state) {
        println!("    ! {}: {}", notification.title, notification.message);
    }
    if state.game_over {
        match defeat_cause(state) {
            Some(cause) => println!("    GAME OVER: {}.", cause_text(cause)),
            None => println!("    VICTORY: the core ignited and the siege is broken."),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let content_dir = cli.content_dir.as_str();
    let save_dir = cli.save_dir.as_path();
    match cli.command {
        Commands::New { difficulty } => new_game(content_dir, save_dir, difficulty),
        Commands::Status => show_status(content_dir, save_dir),
        Commands::Advance { cycles } => advance(content_dir, save_dir, cycles),
        Commands::Allocate {
            farmers,
            miners,
            soldiers,
        } => {
            let policy = AllocationPolicy::new(farmers, miners, soldiers);
            play_command(content_dir, save_dir, &Command::SetAllocation { policy })
        }
        Commands::Stance { stance } => {
            play_command(content_dir, save_dir, &Command::SetStance { stance })
        }
        Commands::Research { tech } => {
            play_command(content_dir, save_dir, &Command::StartResearch { tech_id: tech })
        }
        Commands::Banish => play_command(content_dir, save_dir, &Command::BanishThreat),
        Commands::Ignite => play_command(content_dir, save_dir, &Command::IgniteCore),
        Commands::Run {
            cycles,
            difficulty,
            print_every,
            metrics_every,
            no_metrics,
        } => run(
            content_dir,
            &RunOptions {
                cycles,
                difficulty,
                print_every,
                metrics_every,
                no_metrics,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::test_fixtures::{base_content, base_state};
    use tempfile::TempDir;

    const CONTENT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../content");

    #[test]
    fn test_parses_enum_arguments_loosely() {
        let cli = Cli::try_parse_from(["siege_cli", "research", "crop-rotation"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Research {
                tech: TechId::CropRotation
            }
        ));

        let cli = Cli::try_parse_from(["siege_cli", "stance", "sally_forth"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Stance {
                stance: DefenseStance::SallyForth
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_tech() {
        assert!(Cli::try_parse_from(["siege_cli", "research", "gunpowder"]).is_err());
    }

    #[test]
    fn test_global_dirs_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "siege_cli",
            "new",
            "--difficulty",
            "legend",
            "--save-dir",
            "/tmp/slot",
        ])
        .unwrap();
        assert_eq!(cli.save_dir, PathBuf::from("/tmp/slot"));
        assert_eq!(cli.content_dir, "./content");
        assert!(matches!(
            cli.command,
            Commands::New {
                difficulty: Difficulty::Legend
            }
        ));
    }

    #[test]
    fn test_cycle_advanced_is_not_printed() {
        assert_eq!(describe(&Event::CycleAdvanced), None);
        assert_eq!(
            describe(&Event::ResearchCompleted {
                tech_id: TechId::Masonry
            })
            .as_deref(),
            Some("*** RESEARCH COMPLETE: MASONRY ***")
        );
    }

    #[test]
    fn test_research_line_shows_progress_and_eta() {
        let content = base_content();
        let mut state = base_state(&content);
        assert_eq!(research_line(&state, &content.constants), "idle");

        state.active_research_id = Some(TechId::CropRotation);
        let line = research_line(&state, &content.constants);
        // No scientists at the start, so nothing moves.
        assert!(line.starts_with("Crop Rotation 0/"));
        assert!(line.ends_with("(stalled)"));
    }

    #[test]
    fn test_no_op_hint_mentions_game_over() {
        let content = base_content();
        let mut state = base_state(&content);
        state.game_over = true;
        assert!(no_op_hint(&state, &Command::BanishThreat).contains("game is over"));
    }

    #[test]
    fn test_commands_persist_through_the_save_slot() {
        let dir = TempDir::new().unwrap();
        new_game(CONTENT_DIR, dir.path(), Difficulty::Recruit).unwrap();
        play_command(
            CONTENT_DIR,
            dir.path(),
            &Command::SetStance {
                stance: DefenseStance::Fortify,
            },
        )
        .unwrap();
        advance(CONTENT_DIR, dir.path(), 2).unwrap();

        let state = SaveStore::new(dir.path()).load().unwrap();
        assert_eq!(state.stance, DefenseStance::Fortify);
        assert_eq!(state.cycle, 3);
        assert_eq!(state.difficulty, Difficulty::Recruit);
    }

    #[test]
    fn test_playing_without_a_save_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = play_command(CONTENT_DIR, dir.path(), &Command::BanishThreat).unwrap_err();
        assert!(err.to_string().contains("no saved game"));
    }
}
