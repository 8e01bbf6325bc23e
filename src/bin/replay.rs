use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use run_tracker_rs::export::GpxTrack;
use run_tracker_rs::location::FixLog;
use run_tracker_rs::metrics::format_elapsed;
use run_tracker_rs::session::FixOutcome;
use run_tracker_rs::{project, Session, TrackerConfig};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Replay a recorded fix log through a tracking session", long_about = None)]
struct Args {
    /// Path to a {"fixes": [...]} log (.json or .json.gz)
    #[arg(long)]
    log: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Body weight in kg (overrides the configured profile)
    #[arg(long)]
    weight: Option<f64>,

    /// Write the final route as SVG
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the final route as GPX
    #[arg(long)]
    gpx: Option<PathBuf>,
}

#[derive(Default)]
struct ReplayCounts {
    accepted: usize,
    rejected: usize,
    ignored: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(weight) = args.weight {
        config.profile.body_weight_kg = weight;
    }
    config.validate()?;

    let log = FixLog::load(&args.log)
        .with_context(|| format!("loading {}", args.log.display()))?;
    let fixes = log.sorted_fixes();
    let Some(first) = fixes.first() else {
        bail!("{} contains no fixes", args.log.display());
    };
    let t0 = first.timestamp;

    let mut session = Session::new(config.fix_lapse_secs, config.watch.timeout_secs());
    session.start();

    // One tick per whole second elapsed since the first fix
    let mut counts = ReplayCounts::default();
    let mut ticks = 0u64;
    'replay: for fix in &fixes {
        let due = Duration::try_from_secs_f64((fix.timestamp - t0).max(0.0))
            .with_context(|| format!("fix at {} cannot be scheduled", fix.timestamp))?
            .as_secs();
        while ticks < due {
            ticks += 1;
            if let Some(fault) = session.on_tick() {
                log::warn!("Replay ended at {}s: {}", ticks, fault);
                break 'replay;
            }
        }

        match session.on_fix(fix) {
            FixOutcome::Accepted => counts.accepted += 1,
            FixOutcome::Rejected => counts.rejected += 1,
            FixOutcome::Ignored => counts.ignored += 1,
        }
    }

    if let Some(fault) = session.fault().cloned() {
        bail!("session faulted after {}s: {}", session.metrics().elapsed_seconds, fault);
    }

    let Some(finished) = session.stop(config.profile.body_weight_kg) else {
        bail!("session produced no summary");
    };

    println!(
        "Replayed {} fixes over {}: {} accepted, {} rejected",
        fixes.len(),
        format_elapsed(finished.summary.duration_seconds),
        counts.accepted,
        counts.rejected
    );

    let output = json!({
        "log": args.log.display().to_string(),
        "fixes": fixes.len(),
        "accepted": counts.accepted,
        "rejected": counts.rejected,
        "ignored": counts.ignored,
        "summary": finished.summary,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(path) = &args.svg {
        let frame = project(&finished.path, &config.surface);
        std::fs::write(path, frame.to_svg())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if let Some(path) = &args.gpx {
        let name = args
            .log
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "replay".to_string());
        GpxTrack::from_path(&name, "Replayed run", &finished.path).write(path)?;
    }

    Ok(())
}
