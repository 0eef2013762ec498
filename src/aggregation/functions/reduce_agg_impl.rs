use serde_json::Value;

use crate::{
    aggregation::{
        Accumulator, AccumulatorArgs, AccumulatorStateDescriptor, AccumulatorTraits, AggregateImpl,
        AggregationError, GroupedAccumulator, LambdaProvider, RowAccumulator, RowAggregation, RowGroupedAccumulator,
    },
    aggregation::functions::row_aggregation::{lambda},
    types::LogicalType,
};

/// `reduce_agg(value, initial, input_fn, combine_fn)`.
///
/// The state starts at `initial` on the first non-null value; then
/// `input_fn(state, value)` folds rows in and `combine_fn(state, other)`
/// merges partial states.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceAggImpl;

const INPUT_FN: usize = 0;
const COMBINE_FN: usize = 1;

impl AggregateImpl for ReduceAggImpl {
    fn name(&self) -> &'static str { "reduce_agg" }

    fn input_arity(&self) -> usize { 2 }

    fn lambda_count(&self) -> usize { 2 }

    fn traits(&self) -> AccumulatorTraits { AccumulatorTraits::default().without_distinct() }

    fn state_descriptors(&self) -> Vec<AccumulatorStateDescriptor> {
        vec![AccumulatorStateDescriptor::new("state", LogicalType::Json, Value::Null)]
    }

    fn state_layout(&self) -> Vec<LogicalType> { vec![LogicalType::Json] }

    fn create_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> {
        Ok(Box::new(RowAccumulator::new(*self, args)))
    }

    fn create_grouped_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        Ok(Box::new(RowGroupedAccumulator::new(*self, args)))
    }
}

impl RowAggregation for ReduceAggImpl {
    fn input(&self, state: &mut [Value], args: &[Value], lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        let (value, initial) = (&args[0], &args[1]);
        if value.is_null() {
            return Ok(());
        }
        let current = if state[0].is_null() { initial.clone() } else { state[0].take() };
        state[0] = lambda(self.name(), lambdas, INPUT_FN)?.call(&[current, value.clone()])?;
        Ok(())
    }

    fn combine(&self, state: &mut [Value], other: &[Value], lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        if other[0].is_null() {
            return Ok(());
        }
        state[0] = if state[0].is_null() {
            other[0].clone()
        } else {
            lambda(self.name(), lambdas, COMBINE_FN)?.call(&[state[0].take(), other[0].clone()])?
        };
        Ok(())
    }

    fn output(&self, state: &[Value]) -> Result<Value, AggregationError> {
        Ok(state[0].clone())
    }
}
