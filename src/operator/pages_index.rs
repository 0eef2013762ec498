use std::cmp::Ordering;

use serde_json::Value;

use crate::{
    aggregation::AggregationError,
    page::{Block, Page},
    types::{LogicalType, SortOrder, TypeOperators},
};

/// Creates [`PagesIndex`] instances; carried by call sites so every buffering
/// decoration sizes its index the same way.
#[derive(Debug, Clone, Default)]
pub struct PagesIndexFactory {
    expected_positions: usize,
}

impl PagesIndexFactory {
    pub fn new(expected_positions: usize) -> Self { Self { expected_positions } }

    pub fn new_pages_index(&self, types: Vec<LogicalType>) -> PagesIndex {
        PagesIndex {
            types,
            pages: Vec::new(),
            addresses: Vec::with_capacity(self.expected_positions),
        }
    }
}

/// Append-only buffer of pages addressed row by row, sortable in place.
///
/// Sorting only permutes row addresses; rows with equal keys keep their
/// insertion order.
#[derive(Debug, Clone)]
pub struct PagesIndex {
    types: Vec<LogicalType>,
    pages: Vec<Page>,
    addresses: Vec<(usize, usize)>,
}

impl PagesIndex {
    pub fn types(&self) -> &[LogicalType] { &self.types }
    pub fn position_count(&self) -> usize { self.addresses.len() }
    pub fn is_empty(&self) -> bool { self.addresses.is_empty() }

    pub fn add_page(&mut self, page: Page) -> Result<(), AggregationError> {
        if page.channel_count() != self.types.len() {
            return AggregationError::PageShapeMismatch { expected: self.types.len(), got: page.channel_count() }.err();
        }
        if page.is_empty() {
            return Ok(());
        }
        let page_index = self.pages.len();
        self.addresses.extend((0..page.position_count()).map(|p| (page_index, p)));
        self.pages.push(page);
        Ok(())
    }

    fn cell(&self, address: (usize, usize), channel: usize) -> &Value {
        self.pages[address.0].blocks()[channel].get(address.1).unwrap_or(&Value::Null)
    }

    /// Stable sort of all buffered rows by `channels` under `orderings`.
    pub fn sort(&mut self, channels: &[usize], orderings: &[SortOrder], ops: &TypeOperators) -> Result<(), AggregationError> {
        if channels.len() != orderings.len() {
            return AggregationError::OrderingMismatch { channels: channels.len(), orderings: orderings.len() }.err();
        }
        if let Some(&bad) = channels.iter().find(|c| **c >= self.types.len()) {
            return AggregationError::ChannelOutOfBounds { channel: bad, channels: self.types.len() }.err();
        }

        let mut failure = None;
        let mut addresses = std::mem::take(&mut self.addresses);
        addresses.sort_by(|a, b| {
            for (channel, order) in channels.iter().zip(orderings) {
                match ops.compare(self.types[*channel], self.cell(*a, *channel), self.cell(*b, *channel), *order) {
                    Ok(Ordering::Equal) => continue,
                    Ok(ord) => return ord,
                    Err(e) => {
                        failure.get_or_insert(e);
                        return Ordering::Equal;
                    }
                }
            }
            Ordering::Equal
        });
        self.addresses = addresses;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Materialize `channels` of all rows, in current index order.
    pub fn to_page(&self, channels: &[usize]) -> Result<Page, AggregationError> {
        let blocks = channels.iter()
            .map(|c| {
                if *c >= self.types.len() {
                    return AggregationError::ChannelOutOfBounds { channel: *c, channels: self.types.len() }.err();
                }
                Ok(self.addresses.iter().map(|a| self.cell(*a, *c).clone()).collect::<Block>())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Page::with_position_count(blocks, self.addresses.len())
    }

    pub fn estimated_size(&self) -> usize {
        self.addresses.len() * (std::mem::size_of::<(usize, usize)>() + self.types.len() * std::mem::size_of::<Value>())
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.addresses.clear();
    }
}
