use serde_json::Value;

use crate::{
    aggregation::{
        Accumulator, AccumulatorArgs, AccumulatorStateDescriptor, AccumulatorTraits, AggregateImpl,
        AggregationError, GroupedAccumulator, LambdaProvider, RowAccumulator, RowAggregation, RowGroupedAccumulator,
    },
    aggregation::functions::row_aggregation::{bigint, checked_bigint_add},
    types::LogicalType,
};

/// `count(expr)`: number of non-null inputs. Never null itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountImpl;

impl AggregateImpl for CountImpl {
    fn name(&self) -> &'static str { "count" }

    fn input_arity(&self) -> usize { 1 }

    fn traits(&self) -> AccumulatorTraits { AccumulatorTraits::removable() }

    fn state_descriptors(&self) -> Vec<AccumulatorStateDescriptor> {
        vec![AccumulatorStateDescriptor::new("count", LogicalType::BigInt, Value::from(0))]
    }

    fn state_layout(&self) -> Vec<LogicalType> { vec![LogicalType::BigInt] }

    fn create_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> {
        Ok(Box::new(RowAccumulator::new(*self, args)))
    }

    fn create_grouped_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        Ok(Box::new(RowGroupedAccumulator::new(*self, args)))
    }
}

fn add(state: &mut [Value], delta: i64) -> Result<(), AggregationError> {
    let current = bigint(&state[0])?.unwrap_or(0);
    state[0] = Value::from(checked_bigint_add("count", current, delta)?);
    Ok(())
}

impl RowAggregation for CountImpl {
    fn input(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        if args[0].is_null() { return Ok(()); }
        add(state, 1)
    }

    fn remove(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        if args[0].is_null() { return Ok(()); }
        add(state, -1)
    }

    fn combine(&self, state: &mut [Value], other: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        add(state, bigint(&other[0])?.unwrap_or(0))
    }

    fn output(&self, state: &[Value]) -> Result<Value, AggregationError> {
        Ok(state[0].clone())
    }
}
