use crate::{
    aggregation::{Accumulator, AccumulatorArgs, AccumulatorStateDescriptor, AccumulatorTraits, AggregationError, GroupedAccumulator},
    types::LogicalType,
};

/// Per-aggregate metadata + constructors.
/// One instance is registered globally per function name.
/// It is stateless and thread-safe to share.
pub trait AggregateImpl: Send + Sync {
    /// Canonical lowercase function name ("count", "sum", ...).
    fn name(&self) -> &'static str;

    /// Number of argument channels the accumulators read.
    fn input_arity(&self) -> usize;

    /// Number of lambda providers the accumulators expect.
    fn lambda_count(&self) -> usize { 0 }

    fn traits(&self) -> AccumulatorTraits { AccumulatorTraits::default() }

    /// Declared state, in slot order.
    fn state_descriptors(&self) -> Vec<AccumulatorStateDescriptor>;

    /// Slot types the accumulators actually read and write.
    /// Registration fails when this disagrees with `state_descriptors`.
    fn state_layout(&self) -> Vec<LogicalType>;

    fn create_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError>;

    fn create_grouped_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError>;
}
