// Self-play training for the red and blue agents.
//
//   cargo run --bin pitch-train -- --episodes 200 --seed 7 --output runs/a
//   cargo run --features rl-nn --bin pitch-train -- --backend nn
//
// Progress is restored from and saved to the output directory. Create the
// STOP file there (`touch runs/a/STOP`) to save and exit at the next tick.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use pitch_rl::dqn::{DqnAgent, QEstimator};
use pitch_rl::training::{
    linear_agents, FileStore, StopFile, TraceRenderer, Trainer, TrainingConfig,
};
use pitch_rl::Result;
use tracing::{error, info, warn};

/// Default tick pacing for interactive runs.
const DEFAULT_TICK_RATE_HZ: u32 = 30;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args) {
        error!(error = %e, "training failed");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => TrainingConfig::from_json_file(Path::new(path))?,
        None => TrainingConfig {
            tick_rate_hz: Some(DEFAULT_TICK_RATE_HZ),
            ..TrainingConfig::default()
        },
    };
    if let Some(episodes) = arg_value(args, "--episodes").and_then(|s| s.parse().ok()) {
        config.episodes = episodes;
    }
    if let Some(seed) = arg_value(args, "--seed").and_then(|s| s.parse().ok()) {
        config.seed = Some(seed);
    }
    if let Some(output) = arg_value(args, "--output") {
        config.output_dir = PathBuf::from(output);
    }
    if args.iter().any(|a| a == "--headless") {
        config.tick_rate_hz = None;
    }

    match arg_value(args, "--backend").unwrap_or("linear") {
        "linear" => {
            let (red, blue) = linear_agents(&config)?;
            train(config, red, blue)
        }
        #[cfg(feature = "rl-nn")]
        "nn" => {
            let (red, blue) =
                pitch_rl::training::network_agents(&config, tch::Device::cuda_if_available())?;
            train(config, red, blue)
        }
        other => {
            eprintln!("Unknown --backend '{other}'; expected 'linear' or 'nn' (feature rl-nn).");
            process::exit(2);
        }
    }
}

fn train<E: QEstimator>(config: TrainingConfig, red: DqnAgent<E>, blue: DqnAgent<E>) -> Result<()> {
    let store = FileStore::new(&config.output_dir);
    let stop_path = config.output_dir.join("STOP");
    if stop_path.exists() {
        if let Err(e) = fs::remove_file(&stop_path) {
            warn!(path = ?stop_path, error = %e, "could not remove stale stop file");
        }
    }
    info!(output = ?config.output_dir, "stop with: touch {}", stop_path.display());
    let stop = StopFile::new(stop_path);

    let mut trainer = Trainer::new(config, red, blue, store)?
        .with_cancel(stop)
        .with_renderer(TraceRenderer::new(1));
    let outcome = trainer.run()?;
    println!("{outcome}");
    Ok(())
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
