/*!
 * Memory Simulator - Main Entry Point
 *
 * Replays a JSON script against a block memory engine:
 * - Engine requests (allocate, release, swap-in, policy changes, ...)
 * - Host events (process finished, clock ticks)
 * - Optional snapshot restore and persist via MEMSIM_SNAPSHOT_PATH
 */

use anyhow::{Context, Result};
use memsim_kernel::core::json;
use memsim_kernel::{
    init_tracing, EngineConfig, MemoryEngine, ProcessRegistry, Request, Response,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const SNAPSHOT_PATH_VAR: &str = "MEMSIM_SNAPSHOT_PATH";

/// Host-side events interleaved with engine requests
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HostEvent {
    /// The process finished running; its blocks go on the next release-finished
    Finish { pid: u32 },
    /// Elapsed simulation time in seconds
    Clock { seconds: u64 },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Host(HostEvent),
    Engine(Request),
}

fn is_bincode(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "bin")
}

fn load_snapshot(engine: &mut MemoryEngine, path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    if is_bincode(path) {
        engine.from_bincode(&bytes)?;
    } else {
        engine.from_json(&bytes)?;
    }
    info!(path = %path.display(), "Snapshot restored");
    Ok(())
}

fn save_snapshot(engine: &MemoryEngine, path: &Path) -> Result<()> {
    let bytes = if is_bincode(path) {
        engine.to_bincode()?
    } else {
        json::to_string_pretty(&engine.snapshot())?.into_bytes()
    };
    std::fs::write(path, &bytes)
        .with_context(|| format!("writing snapshot {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Snapshot saved");
    Ok(())
}

fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    let config = EngineConfig::from_env().context("invalid MEMSIM_* configuration")?;
    info!(
        physical = config.physical_blocks,
        swap = config.swap_blocks,
        policy = %config.policy,
        "Memory simulator starting"
    );
    let mut engine = MemoryEngine::new(config);

    let snapshot_path = std::env::var(SNAPSHOT_PATH_VAR).ok().map(PathBuf::from);
    if let Some(path) = snapshot_path.as_deref().filter(|p| p.exists()) {
        load_snapshot(&mut engine, path)?;
    }

    let script_path = std::env::args()
        .nth(1)
        .context("usage: memsim <script.json>")?;
    let script = std::fs::read(&script_path)
        .with_context(|| format!("reading script {}", script_path))?;
    let steps: Vec<Step> =
        json::from_slice(&script).with_context(|| format!("parsing script {}", script_path))?;

    let mut registry = ProcessRegistry::new();
    for (index, step) in steps.into_iter().enumerate() {
        match step {
            Step::Host(HostEvent::Finish { pid }) => registry.finish(pid),
            Step::Host(HostEvent::Clock { seconds }) => {
                if engine.on_clock(Duration::from_secs(seconds)) {
                    info!(step = index, seconds, "Clock interrupt fired");
                }
            }
            Step::Engine(request) => {
                let name = request.name();
                let result = engine.handle(request, &mut registry);
                match &result {
                    Ok(Response::Released(outcome)) => {
                        for pid in &outcome.released {
                            registry.forget(*pid);
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(step = index, request = name, error = %err, "Request failed")
                    }
                }
                println!("{}", json::to_string(&result)?);
            }
        }
    }

    let stats = engine.stats();
    info!(
        physical_used = stats.physical_used,
        swap_used = stats.swap_used,
        pressure = %stats.memory_pressure(),
        "Script complete"
    );

    if let Some(path) = &snapshot_path {
        save_snapshot(&engine, path)?;
    }
    Ok(())
}
