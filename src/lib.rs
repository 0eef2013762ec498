pub mod types;
pub use types::{LogicalType, SortOrder, TypeOperators};

pub mod page;
pub use page::{Block, GroupByIdBlock, Page};

pub mod operator;

pub mod session;
pub use session::{Session, SpillConfig};

pub mod spill;

pub mod aggregation;
pub use aggregation::{
    Accumulator, AccumulatorCallSite, AccumulatorFactory, AccumulatorFactoryBinder, AggregateImpl, AggregateRegistry,
    AggregationError, GenericAccumulatorFactoryBinder, GroupedAccumulator,
};
