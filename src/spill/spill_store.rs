use std::fmt::{self, Display};

use serde_json::Value;
use uuid::Uuid;

use crate::aggregation::AggregationError;

/// Identifies one spilled partition inside a [`SpillStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpillHandle(pub String);

impl SpillHandle {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Display for SpillHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// External storage for checkpointed accumulator state.
///
/// A store is owned by one accumulator on one thread. Each `write` produces a
/// new partition that stays readable until `delete`.
pub trait SpillStore: Send {
    fn write(&mut self, values: Vec<Value>) -> Result<SpillHandle, AggregationError>;

    fn read(&mut self, handle: &SpillHandle) -> Result<Vec<Value>, AggregationError>;

    fn delete(&mut self, handle: &SpillHandle) -> Result<(), AggregationError>;

    /// Total bytes currently held by live partitions.
    fn spilled_bytes(&self) -> usize;
}
