use std::sync::Arc;

use serde_json::Value;

use crate::aggregation::{AccumulatorStateDescriptor, AggregationError};

/// Slots of one running aggregate, laid out in descriptor order.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleState {
    slots: Vec<Value>,
}

impl SingleState {
    pub fn new(descriptors: &[AccumulatorStateDescriptor]) -> Self {
        Self { slots: descriptors.iter().map(AccumulatorStateDescriptor::initial_value).collect() }
    }

    pub fn slots(&self) -> &[Value] { &self.slots }
    pub fn slots_mut(&mut self) -> &mut [Value] { &mut self.slots }

    /// Intermediate form: the slots as one JSON array.
    pub fn to_value(&self) -> Value {
        Value::Array(self.slots.clone())
    }

    pub fn estimated_size(&self) -> usize {
        estimate(&self.slots)
    }
}

/// Per-group slots, one row of `width` values per group id.
///
/// Groups are appended in id order as `ensure_capacity` learns about them;
/// existing rows are never moved back to their initial values.
#[derive(Debug, Clone)]
pub struct GroupedState {
    descriptors: Arc<[AccumulatorStateDescriptor]>,
    slots: Vec<Value>,
    group_count: usize,
}

impl GroupedState {
    pub fn new(descriptors: Arc<[AccumulatorStateDescriptor]>) -> Self {
        Self { descriptors, slots: Vec::new(), group_count: 0 }
    }

    pub fn width(&self) -> usize { self.descriptors.len() }
    pub fn group_count(&self) -> usize { self.group_count }

    pub fn ensure_capacity(&mut self, group_count: usize) {
        if group_count <= self.group_count {
            return;
        }
        self.slots.reserve((group_count - self.group_count) * self.width());
        for _ in self.group_count..group_count {
            self.slots.extend(self.descriptors.iter().map(AccumulatorStateDescriptor::initial_value));
        }
        self.group_count = group_count;
    }

    pub fn group(&self, group_id: usize) -> Result<&[Value], AggregationError> {
        let range = self.range(group_id)?;
        Ok(&self.slots[range])
    }

    pub fn group_mut(&mut self, group_id: usize) -> Result<&mut [Value], AggregationError> {
        let range = self.range(group_id)?;
        Ok(&mut self.slots[range])
    }

    pub fn estimated_size(&self) -> usize {
        estimate(&self.slots)
    }

    fn range(&self, group_id: usize) -> Result<std::ops::Range<usize>, AggregationError> {
        if group_id >= self.group_count {
            return AggregationError::GroupIdOutOfRange { group_id, group_count: self.group_count }.err();
        }
        let start = group_id * self.width();
        Ok(start..start + self.width())
    }
}

fn estimate(values: &[Value]) -> usize {
    values.iter().map(|v| std::mem::size_of::<Value>() + match v {
        Value::String(s) => s.len(),
        Value::Array(items) => estimate(items),
        Value::Object(map) => map.iter().map(|(k, v)| k.len() + estimate(std::slice::from_ref(v))).sum(),
        _ => 0,
    }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;
    use serde_json::json;

    fn descriptors() -> Arc<[AccumulatorStateDescriptor]> {
        Arc::from(vec![
            AccumulatorStateDescriptor::new("sum", LogicalType::Double, json!(0.0)),
            AccumulatorStateDescriptor::new("count", LogicalType::BigInt, json!(0)),
        ])
    }

    #[test]
    fn single_state_starts_from_initial_values() {
        let s = SingleState::new(&descriptors());
        assert_eq!(s.to_value(), json!([0.0, 0]));
    }

    #[test]
    fn grouped_state_grows_without_touching_written_groups() {
        let mut s = GroupedState::new(descriptors());
        s.ensure_capacity(2);
        s.group_mut(1).unwrap()[1] = json!(7);
        s.ensure_capacity(5);
        s.ensure_capacity(3);
        assert_eq!(s.group_count(), 5);
        assert_eq!(s.group(1).unwrap(), &[json!(0.0), json!(7)]);
        assert_eq!(s.group(4).unwrap(), &[json!(0.0), json!(0)]);
    }

    #[test]
    fn grouped_state_rejects_unknown_group() {
        let s = GroupedState::new(descriptors());
        assert_eq!(s.group(0).unwrap_err(), AggregationError::GroupIdOutOfRange { group_id: 0, group_count: 0 });
    }
}
