use indexmap::IndexMap;
use serde_json::Value;

use crate::{aggregation::AggregationError, spill::{SpillHandle, SpillStore}};

/// Keeps spilled partitions in process memory.
#[derive(Debug, Default)]
pub struct InMemorySpillStore {
    partitions: IndexMap<SpillHandle, (Vec<Value>, usize)>,
}

impl InMemorySpillStore {
    pub fn new() -> Self { Self::default() }

    pub fn partition_count(&self) -> usize { self.partitions.len() }
}

impl SpillStore for InMemorySpillStore {
    fn write(&mut self, values: Vec<Value>) -> Result<SpillHandle, AggregationError> {
        let handle = SpillHandle::generate();
        let bytes = serde_json::to_vec(&values).map(|v| v.len()).unwrap_or(0);
        self.partitions.insert(handle.clone(), (values, bytes));
        Ok(handle)
    }

    fn read(&mut self, handle: &SpillHandle) -> Result<Vec<Value>, AggregationError> {
        self.partitions.get(handle)
            .map(|(values, _)| values.clone())
            .ok_or_else(|| AggregationError::Spill(format!("unknown spill partition {handle}")))
    }

    fn delete(&mut self, handle: &SpillHandle) -> Result<(), AggregationError> {
        self.partitions.shift_remove(handle);
        Ok(())
    }

    fn spilled_bytes(&self) -> usize {
        self.partitions.values().map(|(_, bytes)| bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn write_read_delete() {
        let mut store = InMemorySpillStore::new();
        let h = store.write(vec![json!(1), json!([2, 3])]).unwrap();
        assert_eq!(store.read(&h).unwrap(), vec![json!(1), json!([2, 3])]);
        assert!(store.spilled_bytes() > 0);
        store.delete(&h).unwrap();
        assert_eq!(store.partition_count(), 0);
        assert!(matches!(store.read(&h), Err(AggregationError::Spill(_))));
    }
}
