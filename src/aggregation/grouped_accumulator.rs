use serde_json::Value;

use crate::{aggregation::AggregationError, page::{Block, GroupByIdBlock, Page}};

/// Independent aggregate state per dense group id.
///
/// Group ids come from the hash aggregation operator; every input block
/// carries the current group count and the accumulator grows to match it.
pub trait GroupedAccumulator: Send {
    fn name(&self) -> &str;

    fn estimated_size(&self) -> usize;

    /// Number of groups this accumulator holds state for.
    fn group_count(&self) -> usize;

    fn add_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError>;

    fn remove_input(&mut self, _group_ids: &GroupByIdBlock, _page: &Page) -> Result<(), AggregationError> {
        AggregationError::RemoveInputNotSupported(self.name().to_string()).err()
    }

    /// `states[i]` is an intermediate value for group `group_ids[i]`.
    fn add_intermediate(&mut self, group_ids: &GroupByIdBlock, states: &Block) -> Result<(), AggregationError>;

    fn evaluate_intermediate(&self, group_id: usize) -> Result<Value, AggregationError>;

    fn evaluate_final(&self, group_id: usize) -> Result<Value, AggregationError>;

    /// Called once after the last input and before the first `evaluate_final`.
    fn prepare_final(&mut self) -> Result<(), AggregationError> {
        Ok(())
    }

    /// Checkpoint all group state to external storage and start over empty.
    fn spill(&mut self) -> Result<(), AggregationError> {
        AggregationError::SpillNotEnabled.err()
    }

    /// Merge every spilled checkpoint back into memory.
    fn restore(&mut self) -> Result<(), AggregationError> {
        Ok(())
    }

    /// Whether the in-memory state exceeds the session's spill threshold.
    fn should_spill(&self) -> bool {
        false
    }
}
