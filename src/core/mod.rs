/*!
 * Core Module
 * Fundamental types, limits, configuration and serialization helpers
 */

pub mod bincode;
pub mod config;
pub mod errors;
pub mod json;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::EngineConfig;
pub use errors::*;
pub use types::*;
