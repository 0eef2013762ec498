use indexmap::IndexSet;

use crate::{
    aggregation::AggregationError,
    page::Page,
    types::{LogicalType, TypeOperators, ValueKey},
};

/// Assigns dense ids to distinct tuples of typed cells.
///
/// Ids are handed out in first-seen order, so `id == previously seen count`
/// exactly when the tuple is new.
#[derive(Debug, Clone)]
pub struct GroupByHash {
    types: Vec<LogicalType>,
    operators: TypeOperators,
    groups: IndexSet<Vec<ValueKey>>,
}

impl GroupByHash {
    pub(crate) fn new(types: Vec<LogicalType>, operators: TypeOperators) -> Self {
        Self { types, operators, groups: IndexSet::new() }
    }

    pub fn types(&self) -> &[LogicalType] { &self.types }
    pub fn group_count(&self) -> usize { self.groups.len() }

    fn key(&self, page: &Page, channels: &[usize], position: usize) -> Result<Vec<ValueKey>, AggregationError> {
        if channels.len() != self.types.len() {
            return AggregationError::PageShapeMismatch { expected: self.types.len(), got: channels.len() }.err();
        }
        channels.iter().zip(&self.types)
            .map(|(channel, ty)| {
                let block = page.block(*channel)?;
                let cell = block.get(position).unwrap_or(&serde_json::Value::Null);
                self.operators.hash_key(*ty, cell)
            })
            .collect()
    }

    /// Returns the tuple's group id and whether it was newly inserted.
    pub fn put_if_absent(&mut self, page: &Page, channels: &[usize], position: usize) -> Result<(usize, bool), AggregationError> {
        let key = self.key(page, channels, position)?;
        Ok(self.groups.insert_full(key))
    }

    /// Positions of `page` whose tuple on `channels` was never seen before.
    ///
    /// Keys are computed for the whole page before any is inserted, so a type
    /// error leaves the hash unchanged.
    pub fn mark_distinct_positions(&mut self, page: &Page, channels: &[usize]) -> Result<Vec<usize>, AggregationError> {
        let keys = (0..page.position_count())
            .map(|p| self.key(page, channels, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys.into_iter()
            .enumerate()
            .filter_map(|(p, key)| self.groups.insert(key).then_some(p))
            .collect())
    }

    pub fn estimated_size(&self) -> usize {
        self.groups.len() * self.types.len().max(1) * std::mem::size_of::<ValueKey>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::JoinCompiler;
    use serde_json::{json, Value};

    #[test]
    fn marks_first_occurrence_only() {
        let mut hash = JoinCompiler::default().compile_group_by_hash(vec![LogicalType::BigInt, LogicalType::Varchar]);
        let page = Page::from_rows(2, &[
            vec![json!(1), json!("a")],
            vec![json!(1), json!("b")],
            vec![json!(1), json!("a")],
            vec![Value::Null, json!("a")],
            vec![Value::Null, json!("a")],
        ]).unwrap();
        assert_eq!(hash.mark_distinct_positions(&page, &[0, 1]).unwrap(), vec![0, 1, 3]);
        // already seen across pages
        assert!(hash.mark_distinct_positions(&page, &[0, 1]).unwrap().is_empty());
        assert_eq!(hash.group_count(), 3);
    }

    #[test]
    fn put_if_absent_hands_out_dense_ids() {
        let mut hash = JoinCompiler::default().compile_group_by_hash(vec![LogicalType::Varchar]);
        let page = Page::from_rows(1, &[vec![json!("x")], vec![json!("y")], vec![json!("x")]]).unwrap();
        assert_eq!(hash.put_if_absent(&page, &[0], 0).unwrap(), (0, true));
        assert_eq!(hash.put_if_absent(&page, &[0], 1).unwrap(), (1, true));
        assert_eq!(hash.put_if_absent(&page, &[0], 2).unwrap(), (0, false));
    }

    #[test]
    fn type_error_leaves_hash_untouched() {
        let mut hash = JoinCompiler::default().compile_group_by_hash(vec![LogicalType::BigInt]);
        let page = Page::from_rows(1, &[vec![json!(1)], vec![json!("nope")]]).unwrap();
        assert!(hash.mark_distinct_positions(&page, &[0]).is_err());
        assert_eq!(hash.group_count(), 0);
    }
}
