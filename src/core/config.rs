/*!
 * Engine Configuration
 *
 * Store sizes, starting policy, randomness seed and clock interval,
 * overridable from the environment.
 */

use crate::core::limits::{
    DEFAULT_CLOCK_INTERRUPT_INTERVAL, DEFAULT_PHYSICAL_BLOCKS, DEFAULT_SWAP_BLOCKS, MAX_STORE_BLOCKS,
};
use crate::memory::ScalingPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const ENV_PHYSICAL_BLOCKS: &str = "MEMSIM_PHYSICAL_BLOCKS";
pub const ENV_SWAP_BLOCKS: &str = "MEMSIM_SWAP_BLOCKS";
pub const ENV_POLICY: &str = "MEMSIM_POLICY";
pub const ENV_SEED: &str = "MEMSIM_SEED";
pub const ENV_CLOCK_INTERVAL_SECS: &str = "MEMSIM_CLOCK_INTERVAL_SECS";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Store size {0} out of range (1..={max})", max = MAX_STORE_BLOCKS)]
    StoreSize(usize),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub physical_blocks: usize,
    pub swap_blocks: usize,
    pub policy: ScalingPolicy,
    /// Fixed seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
    pub clock_interrupt_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            physical_blocks: DEFAULT_PHYSICAL_BLOCKS,
            swap_blocks: DEFAULT_SWAP_BLOCKS,
            policy: ScalingPolicy::FirstFit,
            seed: None,
            clock_interrupt_interval: DEFAULT_CLOCK_INTERRUPT_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Equally sized physical and swap stores
    pub fn with_blocks(mut self, blocks: usize) -> Self {
        self.physical_blocks = blocks;
        self.swap_blocks = blocks;
        self
    }

    pub fn with_swap_blocks(mut self, blocks: usize) -> Self {
        self.swap_blocks = blocks;
        self
    }

    pub fn with_policy(mut self, policy: ScalingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_clock_interval(mut self, interval: Duration) -> Self {
        self.clock_interrupt_interval = interval;
        self
    }

    /// Defaults overridden by `MEMSIM_*` environment variables
    ///
    /// `MEMSIM_SWAP_BLOCKS` defaults to the physical size when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(blocks) = parse_var(&lookup, ENV_PHYSICAL_BLOCKS, |v| v.parse::<usize>())? {
            config = config.with_blocks(blocks);
        }
        if let Some(blocks) = parse_var(&lookup, ENV_SWAP_BLOCKS, |v| v.parse::<usize>())? {
            config.swap_blocks = blocks;
        }
        if let Some(policy) = parse_var(&lookup, ENV_POLICY, |v| v.parse::<ScalingPolicy>())? {
            config.policy = policy;
        }
        if let Some(seed) = parse_var(&lookup, ENV_SEED, |v| v.parse::<u64>())? {
            config.seed = Some(seed);
        }
        if let Some(secs) = parse_var(&lookup, ENV_CLOCK_INTERVAL_SECS, |v| v.parse::<u64>())? {
            config.clock_interrupt_interval = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for size in [self.physical_blocks, self.swap_blocks] {
            if size == 0 || size > MAX_STORE_BLOCKS {
                return Err(ConfigError::StoreSize(size));
            }
        }
        Ok(())
    }
}

fn parse_var<F, T, E, P>(lookup: &F, var: &'static str, parse: P) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    P: Fn(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => parse(value.trim())
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}
