use serde_json::Value;

use crate::{
    aggregation::{Accumulator, AggregationError, GroupedAccumulator},
    operator::GroupByHash,
    page::{Block, GroupByIdBlock, Page},
};

/// Feeds each distinct tuple of argument cells to the inner accumulator once.
pub struct DistinctingAccumulator {
    inner: Box<dyn Accumulator>,
    argument_channels: Vec<usize>,
    hash: GroupByHash,
}

impl DistinctingAccumulator {
    pub fn new(inner: Box<dyn Accumulator>, argument_channels: Vec<usize>, hash: GroupByHash) -> Self {
        Self { inner, argument_channels, hash }
    }
}

impl Accumulator for DistinctingAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize {
        self.inner.estimated_size() + self.hash.estimated_size()
    }

    fn add_input(&mut self, page: &Page) -> Result<(), AggregationError> {
        let positions = self.hash.mark_distinct_positions(page, &self.argument_channels)?;
        if positions.is_empty() {
            return Ok(());
        }
        self.inner.add_input(&page.get_positions(&positions))
    }

    // a partial state carries no record of the tuples behind it
    fn add_intermediate(&mut self, _state: &Value) -> Result<(), AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_intermediate(&self) -> Result<Value, AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_final(&mut self) -> Result<Value, AggregationError> {
        self.inner.evaluate_final()
    }
}

/// Grouped distinct: tuples are distinct per group, keyed on
/// `(group id, arguments...)`.
pub struct DistinctingGroupedAccumulator {
    inner: Box<dyn GroupedAccumulator>,
    argument_channels: Vec<usize>,
    key_channels: Vec<usize>,
    hash: GroupByHash,
}

impl DistinctingGroupedAccumulator {
    /// `hash` must be compiled over `[bigint, argument types...]`.
    pub fn new(inner: Box<dyn GroupedAccumulator>, argument_channels: Vec<usize>, hash: GroupByHash) -> Self {
        let arity = argument_channels.len();
        let key_channels = std::iter::once(arity).chain(0..arity).collect();
        Self { inner, argument_channels, key_channels, hash }
    }
}

impl GroupedAccumulator for DistinctingGroupedAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize {
        self.inner.estimated_size() + self.hash.estimated_size()
    }

    fn group_count(&self) -> usize { self.inner.group_count() }

    fn add_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        let keyed = page.get_columns(&self.argument_channels)?
            .append_column(group_ids.group_ids().iter().map(|id| Value::from(*id)).collect::<Block>())?;
        let positions = self.hash.mark_distinct_positions(&keyed, &self.key_channels)?;
        // always forwarded so the inner state learns the current group count
        self.inner.add_input(&group_ids.get_positions(&positions), &page.get_positions(&positions))
    }

    fn add_intermediate(&mut self, _group_ids: &GroupByIdBlock, _states: &Block) -> Result<(), AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_intermediate(&self, _group_id: usize) -> Result<Value, AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_final(&self, group_id: usize) -> Result<Value, AggregationError> {
        self.inner.evaluate_final(group_id)
    }

    fn prepare_final(&mut self) -> Result<(), AggregationError> { self.inner.prepare_final() }
}
