use serde_json::Value;

use crate::{aggregation::AggregationError, page::Block};

/// A batch of rows stored column by column.
///
/// Every block holds exactly `position_count` cells. A page may have zero
/// channels and still carry a position count (e.g. the projection of no
/// columns).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    blocks: Vec<Block>,
    position_count: usize,
}

impl Page {
    pub fn new(blocks: Vec<Block>) -> Result<Self, AggregationError> {
        let position_count = blocks.first().map(Block::len).unwrap_or(0);
        Self::with_position_count(blocks, position_count)
    }

    pub fn with_position_count(blocks: Vec<Block>, position_count: usize) -> Result<Self, AggregationError> {
        if let Some(bad) = blocks.iter().find(|b| b.len() != position_count) {
            return AggregationError::PageShapeMismatch { expected: position_count, got: bad.len() }.err();
        }
        Ok(Self { blocks, position_count })
    }

    /// Build a page from row-major data. Every row must have `channel_count` cells.
    pub fn from_rows(channel_count: usize, rows: &[Vec<Value>]) -> Result<Self, AggregationError> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); channel_count];
        for row in rows {
            if row.len() != channel_count {
                return AggregationError::PageShapeMismatch { expected: channel_count, got: row.len() }.err();
            }
            for (column, v) in columns.iter_mut().zip(row) {
                column.push(v.clone());
            }
        }
        Self::with_position_count(columns.into_iter().map(Block::new).collect(), rows.len())
    }

    pub fn empty(position_count: usize) -> Self {
        Self { blocks: Vec::new(), position_count }
    }

    pub fn position_count(&self) -> usize { self.position_count }
    pub fn channel_count(&self) -> usize { self.blocks.len() }
    pub fn is_empty(&self) -> bool { self.position_count == 0 }

    pub fn blocks(&self) -> &[Block] { &self.blocks }

    pub fn block(&self, channel: usize) -> Result<&Block, AggregationError> {
        self.blocks.get(channel)
            .ok_or(AggregationError::ChannelOutOfBounds { channel, channels: self.blocks.len() })
    }

    /// Cells of `channels` at `position`, in channel order.
    pub fn row(&self, channels: &[usize], position: usize) -> Result<Vec<Value>, AggregationError> {
        channels.iter()
            .map(|c| self.block(*c).map(|b| b.get(position).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Project `channels` into a new page whose channels are `0..channels.len()`.
    pub fn get_columns(&self, channels: &[usize]) -> Result<Page, AggregationError> {
        let blocks = channels.iter()
            .map(|c| self.block(*c).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { blocks, position_count: self.position_count })
    }

    /// Keep only the rows at `positions`, in that order.
    pub fn get_positions(&self, positions: &[usize]) -> Page {
        let positions: Vec<usize> = positions.iter().copied().filter(|p| *p < self.position_count).collect();
        Page {
            blocks: self.blocks.iter().map(|b| b.copy_positions(&positions)).collect(),
            position_count: positions.len(),
        }
    }

    pub fn append_column(mut self, block: Block) -> Result<Page, AggregationError> {
        if block.len() != self.position_count {
            return AggregationError::PageShapeMismatch { expected: self.position_count, got: block.len() }.err();
        }
        self.blocks.push(block);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Page {
        Page::from_rows(3, &[
            vec![json!(1), json!("a"), json!(true)],
            vec![json!(2), json!("b"), json!(false)],
            vec![json!(3), Value::Null, json!(true)],
        ]).unwrap()
    }

    #[test]
    fn new_rejects_ragged_blocks() {
        let err = Page::new(vec![Block::new(vec![json!(1)]), Block::new(vec![])]).unwrap_err();
        assert_eq!(err, AggregationError::PageShapeMismatch { expected: 1, got: 0 });
    }

    #[test]
    fn get_columns_renumbers_channels() {
        let p = page().get_columns(&[2, 0]).unwrap();
        assert_eq!(p.channel_count(), 2);
        assert_eq!(p.row(&[0, 1], 1).unwrap(), vec![json!(false), json!(2)]);
    }

    #[test]
    fn get_columns_of_nothing_keeps_positions() {
        let p = page().get_columns(&[]).unwrap();
        assert_eq!(p.channel_count(), 0);
        assert_eq!(p.position_count(), 3);
    }

    #[test]
    fn get_positions_selects_rows_in_order() {
        let p = page().get_positions(&[2, 0]);
        assert_eq!(p.position_count(), 2);
        assert_eq!(p.block(0).unwrap().values(), &[json!(3), json!(1)]);
        assert!(p.block(1).unwrap().is_null(0));
    }

    #[test]
    fn block_out_of_bounds_is_an_error() {
        assert_eq!(page().block(7).unwrap_err(), AggregationError::ChannelOutOfBounds { channel: 7, channels: 3 });
    }
}
