use serde_json::Value;
use tracing::debug;

use crate::{
    aggregation::{AccumulatorArgs, AggregationError, GroupedAccumulator, GroupedConstructor},
    page::{Block, GroupByIdBlock, Page},
    spill::{SpillHandle, SpillStore},
};

/// Lets the operator bound grouped state by checkpointing it.
///
/// `spill` writes every group's intermediate state to the store as one
/// partition and swaps in a freshly constructed accumulator; `restore` (or
/// `prepare_final`) merges all partitions back. Nothing happens unless the
/// caller asks.
pub struct SpillingGroupedAccumulator {
    inner: Box<dyn GroupedAccumulator>,
    constructor: GroupedConstructor,
    args: AccumulatorArgs,
    store: Box<dyn SpillStore>,
    partitions: Vec<SpillHandle>,
    memory_threshold_bytes: usize,
    group_count: usize,
}

impl SpillingGroupedAccumulator {
    pub fn new(
        inner: Box<dyn GroupedAccumulator>,
        constructor: GroupedConstructor,
        args: AccumulatorArgs,
        store: Box<dyn SpillStore>,
        memory_threshold_bytes: usize,
    ) -> Self {
        Self { inner, constructor, args, store, partitions: Vec::new(), memory_threshold_bytes, group_count: 0 }
    }

    pub fn spilled_partitions(&self) -> usize { self.partitions.len() }

    fn ensure_restored(&self) -> Result<(), AggregationError> {
        if self.partitions.is_empty() {
            Ok(())
        } else {
            AggregationError::SpillPending(self.partitions.len()).err()
        }
    }
}

impl GroupedAccumulator for SpillingGroupedAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize { self.inner.estimated_size() }

    fn group_count(&self) -> usize {
        self.group_count.max(self.inner.group_count())
    }

    fn add_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        self.group_count = self.group_count.max(group_ids.group_count());
        self.inner.add_input(group_ids, page)
    }

    fn remove_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        self.group_count = self.group_count.max(group_ids.group_count());
        self.inner.remove_input(group_ids, page)
    }

    fn add_intermediate(&mut self, group_ids: &GroupByIdBlock, states: &Block) -> Result<(), AggregationError> {
        self.group_count = self.group_count.max(group_ids.group_count());
        self.inner.add_intermediate(group_ids, states)
    }

    fn evaluate_intermediate(&self, group_id: usize) -> Result<Value, AggregationError> {
        self.ensure_restored()?;
        self.inner.evaluate_intermediate(group_id)
    }

    fn evaluate_final(&self, group_id: usize) -> Result<Value, AggregationError> {
        self.ensure_restored()?;
        self.inner.evaluate_final(group_id)
    }

    fn prepare_final(&mut self) -> Result<(), AggregationError> {
        self.restore()?;
        self.inner.prepare_final()
    }

    fn spill(&mut self) -> Result<(), AggregationError> {
        let states = (0..self.inner.group_count())
            .map(|g| self.inner.evaluate_intermediate(g))
            .collect::<Result<Vec<_>, _>>()?;
        let groups = states.len();
        let fresh = (self.constructor)(self.args.clone())?;
        let handle = self.store.write(states)?;
        debug!(function = self.inner.name(), groups, partition = %handle, spilled_bytes = self.store.spilled_bytes(), "spilled grouped state");
        self.partitions.push(handle);
        self.inner = fresh;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), AggregationError> {
        while let Some(handle) = self.partitions.first().cloned() {
            let states: Block = self.store.read(&handle)?.into();
            let ids = GroupByIdBlock::new(self.group_count.max(states.len()), (0..states.len()).collect())?;
            self.inner.add_intermediate(&ids, &states)?;
            // merged: never fold this partition in again, even if the delete fails
            self.partitions.remove(0);
            debug!(function = self.inner.name(), groups = states.len(), partition = %handle, "restored grouped state");
            self.store.delete(&handle)?;
        }
        // groups that never reached a partition still need a slot
        if self.inner.group_count() < self.group_count {
            let ids = GroupByIdBlock::new(self.group_count, Vec::new())?;
            self.inner.add_intermediate(&ids, &Block::default())?;
        }
        Ok(())
    }

    fn should_spill(&self) -> bool {
        self.inner.estimated_size() > self.memory_threshold_bytes
    }
}
