use serde_json::Value;

use crate::{
    aggregation::{
        Accumulator, AccumulatorArgs, AccumulatorStateDescriptor, AggregateImpl, AggregationError, GroupedAccumulator,
        LambdaProvider, RowAccumulator, RowAggregation, RowGroupedAccumulator,
    },
    types::LogicalType,
};

/// `array_agg(x)`: inputs in arrival order, nulls included. Null when empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayAggImpl;

impl AggregateImpl for ArrayAggImpl {
    fn name(&self) -> &'static str { "array_agg" }

    fn input_arity(&self) -> usize { 1 }

    fn state_descriptors(&self) -> Vec<AccumulatorStateDescriptor> {
        vec![AccumulatorStateDescriptor::with_factory("values", LogicalType::Json, || Value::Array(Vec::new()))]
    }

    fn state_layout(&self) -> Vec<LogicalType> { vec![LogicalType::Json] }

    fn create_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> {
        Ok(Box::new(RowAccumulator::new(*self, args)))
    }

    fn create_grouped_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        Ok(Box::new(RowGroupedAccumulator::new(*self, args)))
    }
}

fn values(state: &mut [Value]) -> Result<&mut Vec<Value>, AggregationError> {
    match &mut state[0] {
        Value::Array(values) => Ok(values),
        other => AggregationError::TypeMismatch { expected: LogicalType::Json, got: other.clone() }.err(),
    }
}

impl RowAggregation for ArrayAggImpl {
    fn input(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        values(state)?.push(args[0].clone());
        Ok(())
    }

    fn combine(&self, state: &mut [Value], other: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        match &other[0] {
            Value::Array(more) => {
                values(state)?.extend(more.iter().cloned());
                Ok(())
            }
            got => AggregationError::TypeMismatch { expected: LogicalType::Json, got: got.clone() }.err(),
        }
    }

    fn output(&self, state: &[Value]) -> Result<Value, AggregationError> {
        match &state[0] {
            Value::Array(values) if values.is_empty() => Ok(Value::Null),
            v => Ok(v.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_arrival_order_and_nulls() {
        let mut state = vec![json!([])];
        for v in [json!(3), Value::Null, json!(1)] {
            ArrayAggImpl.input(&mut state, &[v], &[]).unwrap();
        }
        assert_eq!(ArrayAggImpl.output(&state).unwrap(), json!([3, null, 1]));
    }

    #[test]
    fn empty_is_null_and_remove_is_rejected() {
        let mut state = vec![json!([])];
        assert_eq!(ArrayAggImpl.output(&state).unwrap(), Value::Null);
        let err = ArrayAggImpl.remove(&mut state, &[json!(1)], &[]).unwrap_err();
        assert_eq!(err, AggregationError::RemoveInputNotSupported("array_agg".into()));
    }
}
