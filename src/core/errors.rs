/*!
 * Error Types
 * Centralized error re-exports with thiserror and miette support
 */

// Re-export MemoryError from memory module
pub use crate::memory::{MemoryError, MemoryResult};

// Re-export ConfigError from config module
pub use crate::core::config::ConfigError;

// Serialization helper errors
pub use crate::core::bincode::BincodeError;
pub use crate::core::json::JsonError;
