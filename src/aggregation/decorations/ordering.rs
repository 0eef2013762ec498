use serde_json::Value;
use tracing::trace;

use crate::{
    aggregation::{Accumulator, AggregationError, GroupedAccumulator},
    operator::PagesIndex,
    page::{Block, GroupByIdBlock, Page},
    types::{SortOrder, TypeOperators},
};

/// Buffers `[arguments..., order keys...]` of every input row and replays the
/// arguments, stably sorted by the order keys, when the final value is asked
/// for. The inner accumulator reads its arguments from channels `0..n`.
pub struct OrderingAccumulator {
    inner: Box<dyn Accumulator>,
    buffer_channels: Vec<usize>,
    argument_count: usize,
    orderings: Vec<SortOrder>,
    index: PagesIndex,
    operators: TypeOperators,
    replayed: bool,
}

impl OrderingAccumulator {
    pub fn new(
        inner: Box<dyn Accumulator>,
        argument_channels: Vec<usize>,
        order_by_channels: Vec<usize>,
        orderings: Vec<SortOrder>,
        index: PagesIndex,
        operators: TypeOperators,
    ) -> Self {
        let argument_count = argument_channels.len();
        let buffer_channels = [argument_channels, order_by_channels].concat();
        Self { inner, buffer_channels, argument_count, orderings, index, operators, replayed: false }
    }

    fn sort_channels(&self) -> Vec<usize> {
        (self.argument_count..self.buffer_channels.len()).collect()
    }

    fn replay(&mut self) -> Result<(), AggregationError> {
        self.index.sort(&self.sort_channels(), &self.orderings, &self.operators)?;
        let sorted = self.index.to_page(&(0..self.argument_count).collect::<Vec<_>>())?;
        trace!(rows = sorted.position_count(), "replaying ordered input");
        self.inner.add_input(&sorted)?;
        self.index.clear();
        self.replayed = true;
        Ok(())
    }
}

impl Accumulator for OrderingAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize {
        self.inner.estimated_size() + self.index.estimated_size()
    }

    fn add_input(&mut self, page: &Page) -> Result<(), AggregationError> {
        if self.replayed {
            return AggregationError::AccumulatorFinalized.err();
        }
        self.index.add_page(page.get_columns(&self.buffer_channels)?)
    }

    fn add_intermediate(&mut self, _state: &Value) -> Result<(), AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_intermediate(&self) -> Result<Value, AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_final(&mut self) -> Result<Value, AggregationError> {
        if !self.replayed {
            self.replay()?;
        }
        self.inner.evaluate_final()
    }
}

/// Grouped ordering: rows are buffered as `[group id, arguments..., order
/// keys...]` and replayed in `prepare_final`. Sorting the whole buffer by the
/// order keys keeps every group's rows in order, since the sort is stable.
pub struct OrderingGroupedAccumulator {
    inner: Box<dyn GroupedAccumulator>,
    buffer_channels: Vec<usize>,
    argument_count: usize,
    orderings: Vec<SortOrder>,
    index: PagesIndex,
    operators: TypeOperators,
    group_count: usize,
    prepared: bool,
}

impl OrderingGroupedAccumulator {
    /// `index` must be typed `[bigint, argument types..., order key types...]`.
    pub fn new(
        inner: Box<dyn GroupedAccumulator>,
        argument_channels: Vec<usize>,
        order_by_channels: Vec<usize>,
        orderings: Vec<SortOrder>,
        index: PagesIndex,
        operators: TypeOperators,
    ) -> Self {
        let argument_count = argument_channels.len();
        let buffer_channels = [argument_channels, order_by_channels].concat();
        Self { inner, buffer_channels, argument_count, orderings, index, operators, group_count: 0, prepared: false }
    }
}

impl GroupedAccumulator for OrderingGroupedAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize {
        self.inner.estimated_size() + self.index.estimated_size()
    }

    fn group_count(&self) -> usize {
        self.group_count.max(self.inner.group_count())
    }

    fn add_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        if self.prepared {
            return AggregationError::AccumulatorFinalized.err();
        }
        if group_ids.position_count() != page.position_count() {
            return AggregationError::PageShapeMismatch { expected: page.position_count(), got: group_ids.position_count() }.err();
        }
        let projected = page.get_columns(&self.buffer_channels)?;
        let ids: Block = group_ids.group_ids().iter().map(|id| Value::from(*id)).collect();
        let blocks = std::iter::once(ids).chain(projected.blocks().iter().cloned()).collect();
        self.index.add_page(Page::with_position_count(blocks, page.position_count())?)?;
        self.group_count = self.group_count.max(group_ids.group_count());
        Ok(())
    }

    fn add_intermediate(&mut self, _group_ids: &GroupByIdBlock, _states: &Block) -> Result<(), AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_intermediate(&self, _group_id: usize) -> Result<Value, AggregationError> {
        AggregationError::IntermediateNotSupported(self.name().to_string()).err()
    }

    fn evaluate_final(&self, group_id: usize) -> Result<Value, AggregationError> {
        if !self.prepared {
            return AggregationError::NotPrepared.err();
        }
        self.inner.evaluate_final(group_id)
    }

    fn prepare_final(&mut self) -> Result<(), AggregationError> {
        if self.prepared {
            return Ok(());
        }
        let sort_channels: Vec<usize> = (1 + self.argument_count..1 + self.buffer_channels.len()).collect();
        self.index.sort(&sort_channels, &self.orderings, &self.operators)?;

        let sorted = self.index.to_page(&(0..=self.argument_count).collect::<Vec<_>>())?;
        let ids = sorted.block(0)?.iter()
            .map(|v| v.as_u64().map(|id| id as usize).ok_or_else(|| AggregationError::Function(format!("corrupt group id {v}"))))
            .collect::<Result<Vec<_>, _>>()?;
        let group_ids = GroupByIdBlock::new(self.group_count, ids)?;
        let arguments = sorted.get_columns(&(1..=self.argument_count).collect::<Vec<_>>())?;

        trace!(rows = arguments.position_count(), groups = self.group_count, "replaying ordered grouped input");
        self.inner.add_input(&group_ids, &arguments)?;
        self.inner.prepare_final()?;
        self.index.clear();
        self.prepared = true;
        Ok(())
    }
}
