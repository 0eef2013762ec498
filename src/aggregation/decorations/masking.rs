use serde_json::Value;

use crate::{
    aggregation::{Accumulator, AggregationError, GroupedAccumulator},
    page::{Block, GroupByIdBlock, Page},
    types::LogicalType,
};

/// Positions whose mask cell is `true`; `None` when every row passes.
fn selected_positions(page: &Page, mask_channel: usize) -> Result<Option<Vec<usize>>, AggregationError> {
    let mask = page.block(mask_channel)?;
    let mut positions = Vec::with_capacity(mask.len());
    for (position, cell) in mask.iter().enumerate() {
        match cell {
            Value::Bool(true) => positions.push(position),
            Value::Bool(false) | Value::Null => {}
            other => return AggregationError::TypeMismatch { expected: LogicalType::Boolean, got: other.clone() }.err(),
        }
    }
    Ok((positions.len() != page.position_count()).then_some(positions))
}

/// Outermost stage of every factory-built scalar accumulator: applies the
/// mask channel and refuses retraction the binder did not declare.
pub struct MaskedAccumulator {
    inner: Box<dyn Accumulator>,
    mask_channel: Option<usize>,
    allow_remove_input: bool,
}

impl MaskedAccumulator {
    pub fn new(inner: Box<dyn Accumulator>, mask_channel: Option<usize>, allow_remove_input: bool) -> Self {
        Self { inner, mask_channel, allow_remove_input }
    }

    fn filtered(&self, page: &Page) -> Result<Option<Page>, AggregationError> {
        let Some(mask) = self.mask_channel else { return Ok(None) };
        Ok(selected_positions(page, mask)?.map(|positions| page.get_positions(&positions)))
    }
}

impl Accumulator for MaskedAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize { self.inner.estimated_size() }

    fn add_input(&mut self, page: &Page) -> Result<(), AggregationError> {
        match self.filtered(page)? {
            Some(filtered) => self.inner.add_input(&filtered),
            None => self.inner.add_input(page),
        }
    }

    fn remove_input(&mut self, page: &Page) -> Result<(), AggregationError> {
        if !self.allow_remove_input {
            return AggregationError::RemoveInputNotSupported(self.name().to_string()).err();
        }
        match self.filtered(page)? {
            Some(filtered) => self.inner.remove_input(&filtered),
            None => self.inner.remove_input(page),
        }
    }

    fn add_intermediate(&mut self, state: &Value) -> Result<(), AggregationError> {
        self.inner.add_intermediate(state)
    }

    fn evaluate_intermediate(&self) -> Result<Value, AggregationError> {
        self.inner.evaluate_intermediate()
    }

    fn evaluate_final(&mut self) -> Result<Value, AggregationError> {
        self.inner.evaluate_final()
    }
}

/// Grouped counterpart of [`MaskedAccumulator`].
pub struct MaskedGroupedAccumulator {
    inner: Box<dyn GroupedAccumulator>,
    mask_channel: Option<usize>,
    allow_remove_input: bool,
}

impl MaskedGroupedAccumulator {
    pub fn new(inner: Box<dyn GroupedAccumulator>, mask_channel: Option<usize>, allow_remove_input: bool) -> Self {
        Self { inner, mask_channel, allow_remove_input }
    }

    fn filtered(&self, group_ids: &GroupByIdBlock, page: &Page) -> Result<Option<(GroupByIdBlock, Page)>, AggregationError> {
        let Some(mask) = self.mask_channel else { return Ok(None) };
        Ok(selected_positions(page, mask)?
            .map(|positions| (group_ids.get_positions(&positions), page.get_positions(&positions))))
    }
}

impl GroupedAccumulator for MaskedGroupedAccumulator {
    fn name(&self) -> &str { self.inner.name() }

    fn estimated_size(&self) -> usize { self.inner.estimated_size() }

    fn group_count(&self) -> usize { self.inner.group_count() }

    fn add_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        match self.filtered(group_ids, page)? {
            Some((ids, filtered)) => self.inner.add_input(&ids, &filtered),
            None => self.inner.add_input(group_ids, page),
        }
    }

    fn remove_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        if !self.allow_remove_input {
            return AggregationError::RemoveInputNotSupported(self.name().to_string()).err();
        }
        match self.filtered(group_ids, page)? {
            Some((ids, filtered)) => self.inner.remove_input(&ids, &filtered),
            None => self.inner.remove_input(group_ids, page),
        }
    }

    fn add_intermediate(&mut self, group_ids: &GroupByIdBlock, states: &Block) -> Result<(), AggregationError> {
        self.inner.add_intermediate(group_ids, states)
    }

    fn evaluate_intermediate(&self, group_id: usize) -> Result<Value, AggregationError> {
        self.inner.evaluate_intermediate(group_id)
    }

    fn evaluate_final(&self, group_id: usize) -> Result<Value, AggregationError> {
        self.inner.evaluate_final(group_id)
    }

    fn prepare_final(&mut self) -> Result<(), AggregationError> { self.inner.prepare_final() }

    fn spill(&mut self) -> Result<(), AggregationError> { self.inner.spill() }

    fn restore(&mut self) -> Result<(), AggregationError> { self.inner.restore() }

    fn should_spill(&self) -> bool { self.inner.should_spill() }
}
