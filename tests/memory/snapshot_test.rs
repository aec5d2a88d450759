/*!
 * Snapshot Tests
 * Persistence port round trips and rejection of inconsistent snapshots
 */

use super::common::{alloc, engine};
use memsim_kernel::memory::{EngineSnapshot, MemoryEngine, MemoryError, ScalingPolicy, Slot};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn busy_engine() -> MemoryEngine {
    let mut engine = engine(6, ScalingPolicy::Lru);
    alloc(&mut engine, 1, 3);
    alloc(&mut engine, 2, 2);
    alloc(&mut engine, 3, 4);
    engine
}

#[test]
fn test_json_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.json");
    let source = busy_engine();
    fs::write(&path, source.to_json().unwrap()).unwrap();

    let mut restored = engine(1, ScalingPolicy::FirstFit);
    restored.from_json(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(restored.snapshot(), source.snapshot());
    assert_eq!(restored.stats().swap_used, source.stats().swap_used);
}

#[test]
fn test_bincode_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.bin");
    let source = busy_engine();
    fs::write(&path, source.to_bincode().unwrap()).unwrap();

    let mut restored = engine(1, ScalingPolicy::FirstFit);
    restored.from_bincode(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(restored.snapshot(), source.snapshot());
}

#[test]
fn test_restored_engine_keeps_working() {
    let source = busy_engine();
    let mut restored = engine(1, ScalingPolicy::FirstFit);
    restored.restore(source.snapshot()).unwrap();

    alloc(&mut restored, 4, 2);
    restored.bring_to_physical(1).unwrap();
    restored.verify().unwrap();
}

#[test]
fn test_policy_serializes_as_string() {
    let json: serde_json::Value =
        serde_json::from_slice(&busy_engine().to_json().unwrap()).unwrap();
    assert_eq!(json["policy"], "lru");
    assert_eq!(json["allocation_order"].as_array().map(Vec::len), Some(2));
}

fn rejects(mutate: impl FnOnce(&mut EngineSnapshot)) -> MemoryError {
    let mut snapshot = busy_engine().snapshot();
    mutate(&mut snapshot);
    let mut target = engine(5, ScalingPolicy::Nru);
    let before = target.snapshot();
    let err = target.restore(snapshot).unwrap_err();
    assert_eq!(target.snapshot(), before);
    err
}

#[test]
fn test_rejects_slot_pointing_to_unknown_process() {
    let err = rejects(|s| s.physical[0].occupant = Some(77));
    assert!(matches!(err, MemoryError::InvalidSnapshot(_)));
}

#[test]
fn test_rejects_misnumbered_slots() {
    let err = rejects(|s| s.swap[0] = Slot::empty(3));
    assert!(matches!(err, MemoryError::InvalidSnapshot(_)));
}

#[test]
fn test_rejects_order_missing_resident() {
    let err = rejects(|s| {
        s.allocation_order.pop();
    });
    assert!(matches!(err, MemoryError::InvalidSnapshot(_)));
}

#[test]
fn test_rejects_stale_swap_flag() {
    let err = rejects(|s| {
        for process in &mut s.processes {
            process.in_swap = !process.in_swap;
        }
    });
    assert!(matches!(err, MemoryError::InvalidSnapshot(_)));
}
