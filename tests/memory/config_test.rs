/*!
 * Configuration Tests
 * Environment-driven engine configuration
 */

use memsim_kernel::core::config::{
    ENV_CLOCK_INTERVAL_SECS, ENV_PHYSICAL_BLOCKS, ENV_POLICY, ENV_SEED, ENV_SWAP_BLOCKS,
};
use memsim_kernel::{ConfigError, EngineConfig, MemoryEngine, ScalingPolicy};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::time::Duration;

const ALL_VARS: [&str; 5] = [
    ENV_PHYSICAL_BLOCKS,
    ENV_SWAP_BLOCKS,
    ENV_POLICY,
    ENV_SEED,
    ENV_CLOCK_INTERVAL_SECS,
];

fn clear_env() {
    for var in ALL_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    let config = EngineConfig::from_env().unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    env::set_var(ENV_PHYSICAL_BLOCKS, "30");
    env::set_var(ENV_SWAP_BLOCKS, "10");
    env::set_var(ENV_POLICY, "worst_fit");
    env::set_var(ENV_SEED, "99");
    env::set_var(ENV_CLOCK_INTERVAL_SECS, "5");

    let config = EngineConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.physical_blocks, 30);
    assert_eq!(config.swap_blocks, 10);
    assert_eq!(config.policy, ScalingPolicy::WorstFit);
    assert_eq!(config.seed, Some(99));
    assert_eq!(config.clock_interrupt_interval, Duration::from_secs(5));

    let engine = MemoryEngine::new(config);
    assert_eq!(engine.physical().len(), 30);
    assert_eq!(engine.swap().len(), 10);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_size() {
    clear_env();
    env::set_var(ENV_PHYSICAL_BLOCKS, "lots");
    let err = EngineConfig::from_env().unwrap_err();
    clear_env();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            var: ENV_PHYSICAL_BLOCKS,
            ..
        }
    ));
}
