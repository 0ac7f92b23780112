//! gesture-ctrl replay runner
//!
//! Usage: `gesture-ctrl <script.jsonl> [--dry-run] [--interval-ms N]`

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gesture_ctrl_lib::config::{self, CameraConfig};
use gesture_ctrl_lib::database::UrlStore;
use gesture_ctrl_lib::engine::{GestureEngine, ObservationSink, SourceError};
use gesture_ctrl_lib::platform::SystemController;
use gesture_ctrl_lib::replay::{ReplayClassifier, ReplayScript, ReplaySource};

/// Roughly a 30 FPS camera
const DEFAULT_INTERVAL_MS: u64 = 33;

struct Args {
    script: PathBuf,
    dry_run: bool,
    interval: Duration,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut script = None;
    let mut dry_run = false;
    let mut interval = Duration::from_millis(DEFAULT_INTERVAL_MS);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--interval-ms" => {
                let value = args.next().context("--interval-ms needs a value")?;
                let ms: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid --interval-ms value: {}", value))?;
                interval = Duration::from_millis(ms);
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => {
                if script.replace(PathBuf::from(other)).is_some() {
                    bail!("Only one replay script can be given");
                }
            }
        }
    }

    let script = script
        .context("Usage: gesture-ctrl <script.jsonl> [--dry-run] [--interval-ms N]")?;
    Ok(Args {
        script,
        dry_run,
        interval,
    })
}

fn main() -> anyhow::Result<()> {
    gesture_ctrl_lib::init_logging();
    let args = parse_args()?;

    let mut config = config::load().context("Failed to load configuration")?;
    let script = ReplayScript::load(&args.script)?;

    // The script stands in for both the camera and the model
    config.model.path = Some(args.script.clone());
    config.engine.start_active = true;

    let store = Arc::new(UrlStore::open_default().context("Failed to open URL store")?);
    tracing::info!(
        "URL presets: {} (active: {})",
        store.names()?.join(", "),
        store.active_name()?
    );

    let executor = if args.dry_run {
        tracing::info!("Dry run: actions will only be logged");
        SystemController::dry_run()
    } else {
        SystemController::new(&config.platform)
    };

    let interval = args.interval;
    let mut engine = GestureEngine::open(
        &config,
        |_: &Path, sink: ObservationSink| Ok::<_, SourceError>(ReplayClassifier::new(sink)),
        move |_: &CameraConfig| Ok::<_, SourceError>(ReplaySource::new(script, interval)),
        executor,
        store,
    )
    .context("Failed to start gesture engine")?;

    let mut frames = 0usize;
    let mut fired = 0usize;
    while let Some(report) = engine.step() {
        frames += 1;
        if let Some(action) = report.fired {
            fired += 1;
            tracing::info!(
                "Frame {}: {} -> {} ({:.1} FPS)",
                frames,
                report.label.as_deref().unwrap_or("-"),
                action,
                report.fps
            );
        }
    }

    let status = engine.status();
    engine.close();

    tracing::info!("Replay finished: {} frames, {} action(s) fired", frames, fired);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
