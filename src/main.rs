mod readout;

use anyhow::{Context, Result};
use clap::Parser;
use nivel_config::AppConfig;
use nivel_level::engine::{LevelEngine, LevelThresholds};
use nivel_level::types::{Reading, ScreenRotation};
use nivel_level::{spawn_sample_reader, LevelClient};
use readout::Readout;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Digital spirit level: turns accelerometer samples into roll/pitch and a level verdict.
///
/// Samples are read one per line as `x y z [rotation_degrees]`.
#[derive(Debug, Parser)]
#[command(name = "nivel", version)]
struct Args {
    /// Sample file to replay (reads stdin when omitted).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Screen rotation in degrees for samples without one (0, 90, 180, 270).
    #[arg(short, long)]
    rotation: Option<i32>,

    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print only the final reading.
    #[arg(long)]
    once: bool,

    /// Write the effective config back to disk before running.
    #[arg(long)]
    save_config: bool,
}

fn thresholds(config: &AppConfig) -> LevelThresholds {
    LevelThresholds {
        z_flat: config.level.z_flat_threshold,
        level_deg: config.level.level_threshold_deg,
        bubble_max_deg: config.level.bubble_max_angle_deg,
    }
}

/// Load the config. With `strict` a broken file is an error, so it never gets
/// overwritten with defaults; otherwise it is logged and defaults are used.
fn load_config(path: Option<&PathBuf>, strict: bool) -> Result<AppConfig> {
    let loaded = match path {
        Some(path) => nivel_config::load_config_from(path),
        None => nivel_config::load_config(),
    };
    match loaded {
        Ok(config) => Ok(config),
        Err(e) if strict => Err(e.context("Refusing to save over a config that failed to load")),
        Err(e) => {
            warn!(?e, "Failed to load config, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Print one line per reading until the stream ends or `shutdown` fires.
/// With `once` nothing is printed here. Returns the last reading seen.
async fn print_readings<W, S>(
    mut readings: mpsc::UnboundedReceiver<Reading>,
    shutdown: S,
    readout: &Readout,
    once: bool,
    out: &mut W,
) -> Result<Option<Reading>>
where
    W: Write,
    S: Future,
{
    tokio::pin!(shutdown);
    let mut last = None;

    loop {
        let reading = tokio::select! {
            reading = readings.recv() => reading,
            _ = &mut shutdown => {
                info!("Interrupted");
                None
            }
        };
        let Some(reading) = reading else {
            break;
        };

        if !once {
            writeln!(out, "{}", readout.render(&reading))?;
        }
        last = Some(reading);
    }

    Ok(last)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only readings.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nivel=info,nivel_level=info,nivel_config=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref(), args.save_config)?;

    if args.save_config {
        match &args.config {
            Some(path) => nivel_config::save_config_to(&config, path)?,
            None => {
                nivel_config::save_config(&config)?;
            }
        }
    }

    let engine = LevelEngine::new(thresholds(&config));
    let rotation = ScreenRotation::from_degrees(
        args.rotation.unwrap_or(config.feed.default_rotation_deg),
    );
    let limits = engine.thresholds();
    info!(
        z_flat = limits.z_flat,
        level_deg = limits.level_deg,
        bubble_max_deg = limits.bubble_max_deg,
        %rotation,
        "Level engine ready"
    );

    let (client, sender, readings) = LevelClient::channel_with_readings(engine);

    // Blocking reads run on a plain thread so an idle stdin can't stall shutdown.
    match &args.input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open sample feed {}", path.display()))?;
            info!(path = %path.display(), "Reading samples from file");
            spawn_sample_reader(file, rotation, sender)?;
        }
        None => {
            info!("Reading samples from stdin");
            spawn_sample_reader(std::io::stdin(), rotation, sender)?;
        }
    }

    let readout = Readout::new(engine, config.readout.clone());
    let last = print_readings(
        readings,
        tokio::signal::ctrl_c(),
        &readout,
        args.once,
        &mut std::io::stdout().lock(),
    )
    .await?;

    if args.once {
        match last {
            Some(reading) => println!("{}", readout.render(&reading)),
            None => warn!("No samples received"),
        }
    }

    info!(samples = client.samples_processed(), "Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nivel_config::ReadoutConfig;

    fn readout() -> Readout {
        Readout::new(LevelEngine::default(), ReadoutConfig::default())
    }

    #[tokio::test]
    async fn replay_prints_one_line_per_sample() {
        let data = std::io::Cursor::new(b"0 0 9.8\n4.9 0 0\n# note\n0 9.8 0 90\n".to_vec());
        let (_client, sender, readings) = LevelClient::channel_with_readings(LevelEngine::default());
        spawn_sample_reader(data, ScreenRotation::Rotation0, sender).unwrap();

        let mut out = Vec::new();
        let last = print_readings(readings, std::future::pending::<()>(), &readout(), false, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Flat (lying)"));
        assert!(lines[1].starts_with("On edge (standing)"));
        assert!(lines[2].contains("-90.0°"));
        assert_eq!(last.unwrap().rotation, ScreenRotation::Rotation90);
    }

    #[tokio::test]
    async fn once_prints_nothing_until_the_end() {
        let data = std::io::Cursor::new(b"4.9 0 0\n0 0 9.8\n".to_vec());
        let (_client, sender, readings) = LevelClient::channel_with_readings(LevelEngine::default());
        spawn_sample_reader(data, ScreenRotation::Rotation0, sender).unwrap();

        let mut out = Vec::new();
        let last = print_readings(readings, std::future::pending::<()>(), &readout(), true, &mut out)
            .await
            .unwrap();

        assert!(out.is_empty());
        assert!(last.unwrap().result.is_level);
    }

    #[tokio::test]
    async fn interrupt_stops_an_idle_stdin_replay() {
        // Sender kept alive: the stream never ends on its own, like a quiet stdin.
        let (_client, _sender, readings) = LevelClient::channel_with_readings(LevelEngine::default());

        let mut out = Vec::new();
        let last = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            print_readings(readings, std::future::ready(()), &readout(), false, &mut out),
        )
        .await
        .expect("interrupt should end the readout loop")
        .unwrap();

        assert!(last.is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn broken_config_is_not_replaced_when_saving() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[level]\nz_flat_threshold = \"high\"\n").unwrap();

        assert!(load_config(Some(&path), true).is_err());
        assert_eq!(load_config(Some(&path), false).unwrap(), AppConfig::default());
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"high\""));
    }
}
