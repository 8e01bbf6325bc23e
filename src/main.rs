use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use run_tracker_rs::export::GpxTrack;
use run_tracker_rs::location::{FixLog, ScriptedLocationService, SimulatedLocationService};
use run_tracker_rs::metrics::format_elapsed;
use run_tracker_rs::{project, AcquisitionStatus, JsonFileStore, Tracker, TrackerConfig};
use std::future::pending;
use std::path::PathBuf;
use tokio::time::{interval, sleep, Duration};

#[derive(Parser, Debug)]
#[command(name = "run_tracker")]
#[command(about = "Live run tracker - distance, pace and calories from location fixes", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until Ctrl-C)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// User id the summary is logged under
    #[arg(long)]
    user: Option<String>,

    /// Body weight in kg for the calorie estimate
    #[arg(long)]
    weight: Option<f64>,

    /// Output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Replay a recorded fix log (.json or .json.gz) instead of simulated fixes
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write the final route as SVG
    #[arg(long)]
    svg: bool,

    /// Write the final route as GPX
    #[arg(long)]
    gpx: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(user) = &args.user {
        config.profile.user_id = user.clone();
    }
    if let Some(weight) = args.weight {
        config.profile.body_weight_kg = weight;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config.validate()?;

    println!("[{}] Run Tracker Starting", ts_now());
    println!("  Duration: {} seconds (0=until Ctrl-C)", args.duration);
    println!("  User: {} ({} kg)", config.profile.user_id, config.profile.body_weight_kg);
    println!("  Output Dir: {}", config.output_dir.display());

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let store = JsonFileStore::new(&config.output_dir);
    let (handle, task) = match &args.replay {
        Some(path) => {
            let log = FixLog::load(path)
                .with_context(|| format!("loading replay log {}", path.display()))?;
            println!("  Source: replay of {} fixes", log.fixes.len());
            let service = ScriptedLocationService::from_fixes(&log.sorted_fixes())
                .with_context(|| format!("scheduling replay of {}", path.display()))?;
            Tracker::new(config.clone(), service, store).spawn()
        }
        None => {
            println!("  Source: simulated");
            Tracker::new(config.clone(), SimulatedLocationService::default(), store).spawn()
        }
    };

    handle.start().await?;
    println!("[{}] Tracking started", ts_now());

    let status_path = config.output_dir.join("live_status.json");
    let mut status_timer = interval(Duration::from_secs(config.status_interval_secs.max(1)));

    let deadline = async {
        if args.duration > 0 {
            sleep(Duration::from_secs(args.duration)).await
        } else {
            pending::<()>().await
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
            _ = &mut ctrl_c => {
                println!("[{}] Interrupted, stopping...", ts_now());
                break;
            }
            _ = status_timer.tick() => {
                let status = handle.status();
                if let Err(e) = status.save(&status_path) {
                    log::warn!("Failed to write {}: {}", status_path.display(), e);
                }

                println!(
                    "[{}] {:<9} {} | {:.2} km | {} steps | {:.1} km/h",
                    ts_now(),
                    status_label(status.status),
                    format_elapsed(status.elapsed_seconds),
                    status.distance_km,
                    status.step_count_estimate,
                    status.instantaneous_speed_kmh
                );

                if status.status == AcquisitionStatus::Off {
                    if let Some(error) = &status.error {
                        eprintln!("[{}] Location error: {}", ts_now(), error);
                        break;
                    }
                }
            }
        }
    }

    // Snapshot before stop so a faulted session's metrics land in the final file
    let final_status = handle.status();
    let finished = handle.stop().await?;

    let final_path = config.output_dir.join("live_status_final.json");
    final_status
        .save(&final_path)
        .with_context(|| format!("writing {}", final_path.display()))?;

    handle.shutdown().await?;
    task.await?;

    let Some(finished) = finished else {
        println!("[{}] No activity recorded", ts_now());
        return Ok(());
    };

    let summary = &finished.summary;
    println!("[{}] Session complete", ts_now());
    println!("  Time: {}", format_elapsed(summary.duration_seconds));
    println!("  Distance: {:.2} km", summary.distance_km);
    println!("  Calories: {} kcal", summary.calories_burned);
    println!("  Route points: {}", finished.path.len());
    println!("{}", serde_json::to_string_pretty(summary)?);

    if args.svg {
        let svg_path = config.output_dir.join(format!("route_{}.svg", ts_now_clean()));
        let frame = project(&finished.path, &config.surface);
        std::fs::write(&svg_path, frame.to_svg())
            .with_context(|| format!("writing {}", svg_path.display()))?;
        println!("  SVG: {}", svg_path.display());
    }

    if args.gpx {
        let gpx_path = config.output_dir.join(format!("route_{}.gpx", ts_now_clean()));
        let track = GpxTrack::from_path(
            &format!("Run {}", summary.timestamp_iso),
            &format!("{:.2} km, {} kcal", summary.distance_km, summary.calories_burned),
            &finished.path,
        );
        track.write(&gpx_path)?;
        println!("  GPX: {}", gpx_path.display());
    }

    Ok(())
}

fn status_label(status: AcquisitionStatus) -> &'static str {
    match status {
        AcquisitionStatus::Off => "OFF",
        AcquisitionStatus::Searching => "SEARCHING",
        AcquisitionStatus::Locked => "LOCKED",
    }
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
