use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default in-memory budget before a spillable accumulator asks to spill.
pub const DEFAULT_SPILL_THRESHOLD_BYTES: usize = 64 * 1024 * 1024;

/// Where and when grouped accumulator state is spilled.
///
/// - `spill_path`: directory for spill files; `None` keeps spilled state in memory.
/// - `memory_threshold_bytes`: estimated state size above which
///   `should_spill()` reports true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpillConfig {
    pub spill_path: Option<PathBuf>,
    pub memory_threshold_bytes: usize,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self { spill_path: None, memory_threshold_bytes: DEFAULT_SPILL_THRESHOLD_BYTES }
    }
}

impl SpillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spill to files under `path`.
    pub fn to_disk(path: impl Into<PathBuf>, memory_threshold_bytes: usize) -> Self {
        Self { spill_path: Some(path.into()), memory_threshold_bytes }
    }

    /// Spill into process memory; mostly useful for tests.
    pub fn in_memory(memory_threshold_bytes: usize) -> Self {
        Self { spill_path: None, memory_threshold_bytes }
    }
}
