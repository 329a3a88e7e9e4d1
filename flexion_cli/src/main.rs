use chrono::Utc;
use clap::{Parser, Subcommand};
use flexion_core::*;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flexion")]
#[command(about = "Muscle recovery and workout session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start configuring a new workout session
    Start {
        /// Workout name
        name: String,
    },

    /// Add an exercise to the session being configured
    Add {
        /// Exercise name (muscles are inferred from it)
        name: String,

        /// Sets as SETSxREPS (e.g. 3x8) or a single rep count
        #[arg(long, default_value = "3x8")]
        sets: String,

        /// Weight per set in kg
        #[arg(long)]
        weight: Option<f64>,

        /// Explicit muscle tags, comma separated (overrides inference)
        #[arg(long)]
        muscles: Option<String>,
    },

    /// Begin the configured workout (starts the clock)
    Begin,

    /// End the active workout, reset recovery timers and journal it
    End {
        /// Free-text notes stored with the workout
        #[arg(long)]
        notes: Option<String>,
    },

    /// Discard the in-progress session without any side effects
    Cancel,

    /// Show recovery status for every muscle group (default)
    Status,

    /// Re-render recovery status on a fixed tick (Ctrl-C to stop)
    Watch,

    /// List recent workouts
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 30)]
        days: i64,
    },

    /// Roll up journaled workouts to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// File layout under the data directory
struct Paths {
    journal: PathBuf,
    csv: PathBuf,
    recovery: PathBuf,
    session: PathBuf,
}

impl Paths {
    fn new(data_dir: &std::path::Path) -> Self {
        Self {
            journal: data_dir.join("journal").join("workouts.jsonl"),
            csv: data_dir.join("workouts.csv"),
            recovery: data_dir.join("cache").join("recovery.json"),
            session: data_dir.join("cache").join("session.json"),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    flexion_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);

    let taxonomy = get_default_taxonomy();
    let errors = taxonomy.validate();
    if !errors.is_empty() {
        eprintln!("Taxonomy validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::TaxonomyValidation("Invalid taxonomy".into()));
    }

    match cli.command {
        Some(Commands::Start { name }) => cmd_start(&paths, &name),
        Some(Commands::Add {
            name,
            sets,
            weight,
            muscles,
        }) => cmd_add(&paths, &name, &sets, weight, muscles.as_deref()),
        Some(Commands::Begin) => cmd_begin(&paths),
        Some(Commands::End { notes }) => cmd_end(&paths, notes),
        Some(Commands::Cancel) => cmd_cancel(&paths),
        Some(Commands::Status) | None => cmd_status(&paths, &config),
        Some(Commands::Watch) => cmd_watch(&paths, &config),
        Some(Commands::History { days }) => cmd_history(&paths, days),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
    }
    .or_else(|e| match e {
        Error::Validation(msg) => {
            eprintln!("✗ {}", msg);
            std::process::exit(1);
        }
        other => Err(other),
    })
}

// ============================================================================
// Session commands
// ============================================================================

fn load_manager(paths: &Paths) -> Result<SessionManager> {
    Ok(match store::load_pending_session(&paths.session)? {
        Some(session) => SessionManager::resume(session),
        None => SessionManager::new(),
    })
}

fn checkpoint(paths: &Paths, manager: &SessionManager) -> Result<()> {
    match manager.session() {
        Some(session) => store::save_pending_session(session, &paths.session),
        None => store::clear_pending_session(&paths.session),
    }
}

fn cmd_start(paths: &Paths, name: &str) -> Result<()> {
    let mut manager = load_manager(paths)?;
    manager.start(name, Utc::now())?;
    checkpoint(paths, &manager)?;

    println!("✓ Configuring workout '{}'", name);
    println!("  Add exercises with: flexion add <name> --sets 3x8");
    Ok(())
}

fn cmd_add(
    paths: &Paths,
    name: &str,
    sets_spec: &str,
    weight: Option<f64>,
    muscles: Option<&str>,
) -> Result<()> {
    let sets = parse_sets(sets_spec, weight)?;

    let descriptor = ExerciseDescriptor {
        name: name.into(),
        explicit_muscle_groups: muscles
            .map(|m| m.split(',').map(|s| s.trim().to_string()).collect()),
        ..ExerciseDescriptor::default()
    };

    let inferred = muscles_for_display(&descriptor);

    let mut manager = load_manager(paths)?;
    manager.add_exercise(descriptor, sets)?;
    checkpoint(paths, &manager)?;

    println!("✓ Added '{}' ({})", name, inferred);
    Ok(())
}

fn cmd_begin(paths: &Paths) -> Result<()> {
    let mut manager = load_manager(paths)?;
    manager.begin(Utc::now())?;
    checkpoint(paths, &manager)?;

    println!("✓ Workout is active. End it with: flexion end");
    Ok(())
}

fn cmd_end(paths: &Paths, notes: Option<String>) -> Result<()> {
    let mut manager = load_manager(paths)?;

    let mut recovery_store = RecoveryStore::load(&paths.recovery)?;
    let mut sink = JsonlSink::new(&paths.journal);

    let outcome = manager.complete(Utc::now(), &mut recovery_store, &mut sink, notes)?;

    // The optimistic reset stands regardless of the journal write outcome
    recovery_store.save(&paths.recovery)?;
    checkpoint(paths, &manager)?;

    println!("✓ Workout '{}' complete!", outcome.workout.name);
    println!(
        "  {} exercises, {} sets, {} reps, {} min",
        outcome.stats.exercises,
        outcome.stats.total_sets,
        outcome.stats.total_reps,
        outcome.stats.duration_minutes
    );

    let taxonomy = get_default_taxonomy();
    let names: Vec<&str> = outcome
        .workout
        .muscles
        .iter()
        .map(|m| taxonomy.display_name(*m))
        .collect();
    println!("  Recovery timers reset: {}", names.join(", "));

    if let Some(e) = outcome.persist_error {
        eprintln!("⚠ Workout could not be journaled: {}", e);
        eprintln!("  Local recovery state was still updated.");
    }

    Ok(())
}

fn cmd_cancel(paths: &Paths) -> Result<()> {
    let mut manager = load_manager(paths)?;
    let discarded = manager.cancel()?;
    checkpoint(paths, &manager)?;

    println!("✓ Cancelled workout '{}' (no timers touched)", discarded.name);
    Ok(())
}

// ============================================================================
// Recovery views
// ============================================================================

/// Merged recovery entries: journal/CSV history vs the optimistic local
/// cache, freshness wins, with config overrides applied on top.
fn merged_entries(
    paths: &Paths,
    config: &Config,
) -> Result<HashMap<MuscleGroup, RecoveryEntry>> {
    let workouts = load_recent_workouts(&paths.journal, &paths.csv, 30)?;
    let remote = recovery_entries_from_workouts(&workouts);
    let local_store = RecoveryStore::load(&paths.recovery)?;

    let mut merged = merge(&remote, local_store.entries());

    for entry in merged.values_mut() {
        if entry.recovery_hours.is_none() {
            entry.recovery_hours = config.recovery_override(entry.muscle);
        }
    }

    Ok(merged)
}

fn cmd_status(paths: &Paths, config: &Config) -> Result<()> {
    render_status(paths, config)?;

    let manager = load_manager(paths)?;
    if let Some(session) = manager.session() {
        println!(
            "  Session '{}' in progress ({:?}, {} exercises)",
            session.name,
            session.status,
            session.exercises.len()
        );
        println!();
    }
    Ok(())
}

fn cmd_watch(paths: &Paths, config: &Config) -> Result<()> {
    let tick = config.tick_seconds();
    println!("Refreshing every {}s (Ctrl-C to stop)", tick);

    loop {
        render_status(paths, config)?;
        std::thread::sleep(std::time::Duration::from_secs(tick));
    }
}

fn render_status(paths: &Paths, config: &Config) -> Result<()> {
    let entries = merged_entries(paths, config)?;
    let snapshots = snapshot_catalog(&entries, Utc::now());
    let taxonomy = get_default_taxonomy();

    println!("\n╭─────────────────────────────────────────────╮");
    println!("│  MUSCLE RECOVERY                            │");
    println!("╰─────────────────────────────────────────────╯");

    for snapshot in &snapshots {
        let name = taxonomy.display_name(snapshot.muscle);
        let state = match snapshot.status {
            RecoveryStatus::FullyRecovered => "ready".to_string(),
            RecoveryStatus::Recovering => format!("{:.0}h left", snapshot.hours_remaining.ceil()),
        };
        println!(
            "  {:<12} {} {:>3.0}%  {}",
            name,
            percent_bar(snapshot.percentage),
            snapshot.percentage,
            state
        );
    }
    println!();
    Ok(())
}

fn percent_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * 10.0).round() as usize;
    let filled = filled.min(10);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

// ============================================================================
// History and rollup
// ============================================================================

fn cmd_history(paths: &Paths, days: i64) -> Result<()> {
    let workouts = load_recent_workouts(&paths.journal, &paths.csv, days)?;

    if workouts.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    let taxonomy = get_default_taxonomy();
    println!("\nLast {} days:", days);
    for workout in &workouts {
        let names: Vec<&str> = workout
            .muscles
            .iter()
            .map(|m| taxonomy.display_name(*m))
            .collect();
        println!(
            "  {}  {:<20} {:>3} min  [{}]",
            workout.completed_at.format("%Y-%m-%d %H:%M"),
            workout.name,
            workout.duration_minutes,
            names.join(", ")
        );
    }
    println!();
    Ok(())
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.journal.exists() {
        println!("No journal file found - nothing to roll up.");
        return Ok(());
    }

    let count = rollup::journal_to_csv_and_archive(&paths.journal, &paths.csv)?;

    println!("✓ Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        if let Some(journal_dir) = paths.journal.parent() {
            let cleaned = rollup::cleanup_processed_journals(journal_dir)?;
            if cleaned > 0 {
                println!("✓ Cleaned up {} processed journal files", cleaned);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a sets spec: "3x8" (three sets of eight) or "12" (one set)
fn parse_sets(spec: &str, weight: Option<f64>) -> Result<Vec<SetEntry>> {
    let spec = spec.trim().to_lowercase();

    let (count, reps) = if let Some((count, reps)) = spec.split_once('x') {
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid set count in '{}'", spec)))?;
        let reps: i32 = reps
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid rep count in '{}'", spec)))?;
        (count, reps)
    } else {
        let reps: i32 = spec
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid sets spec '{}'", spec)))?;
        (1, reps)
    };

    if count == 0 {
        return Err(Error::Validation("An exercise needs at least one set".into()));
    }

    Ok((0..count)
        .map(|_| SetEntry {
            reps,
            weight_kg: weight,
        })
        .collect())
}

fn muscles_for_display(descriptor: &ExerciseDescriptor) -> String {
    let taxonomy = get_default_taxonomy();
    let inferred = infer_muscles(descriptor);
    if inferred.is_empty() {
        return "full body".into();
    }
    inferred
        .iter()
        .map(|m| taxonomy.display_name(*m))
        .collect::<Vec<_>>()
        .join(", ")
}
