use crate::aggregation::AggregationError;

/// Per-row dense group ids produced by the hash aggregation operator.
///
/// `group_count` is the number of groups allocated so far, so every id is
/// strictly below it. It only grows between successive blocks of one
/// operator instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupByIdBlock {
    group_ids: Vec<usize>,
    group_count: usize,
}

impl GroupByIdBlock {
    pub fn new(group_count: usize, group_ids: Vec<usize>) -> Result<Self, AggregationError> {
        if let Some(&bad) = group_ids.iter().find(|id| **id >= group_count) {
            return AggregationError::GroupIdOutOfRange { group_id: bad, group_count }.err();
        }
        Ok(Self { group_ids, group_count })
    }

    /// Group count inferred from the largest id present.
    pub fn from_ids(group_ids: Vec<usize>) -> Self {
        let group_count = group_ids.iter().max().map(|m| m + 1).unwrap_or(0);
        Self { group_ids, group_count }
    }

    pub fn group_count(&self) -> usize { self.group_count }
    pub fn position_count(&self) -> usize { self.group_ids.len() }
    pub fn group_ids(&self) -> &[usize] { &self.group_ids }

    pub fn get_group_id(&self, position: usize) -> usize { self.group_ids[position] }

    /// Keep only the ids at `positions`; the group count is unchanged.
    pub fn get_positions(&self, positions: &[usize]) -> GroupByIdBlock {
        GroupByIdBlock {
            group_ids: positions.iter().filter_map(|p| self.group_ids.get(*p).copied()).collect(),
            group_count: self.group_count,
        }
    }
}
