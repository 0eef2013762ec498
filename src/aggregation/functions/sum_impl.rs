use serde_json::Value;

use crate::{
    aggregation::{
        Accumulator, AccumulatorArgs, AccumulatorStateDescriptor, AccumulatorTraits, AggregateImpl,
        AggregationError, GroupedAccumulator, LambdaProvider, RowAccumulator, RowAggregation, RowGroupedAccumulator,
    },
    aggregation::functions::row_aggregation::{bigint},
    types::LogicalType,
};

/// `sum(bigint)`: null until the first non-null input; overflow is an error.
///
/// The single slot keeps no row count, so retracting every added value with
/// `remove_input` leaves `0` rather than going back to null.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumImpl;

impl AggregateImpl for SumImpl {
    fn name(&self) -> &'static str { "sum" }

    fn input_arity(&self) -> usize { 1 }

    fn traits(&self) -> AccumulatorTraits { AccumulatorTraits::removable() }

    fn state_descriptors(&self) -> Vec<AccumulatorStateDescriptor> {
        vec![AccumulatorStateDescriptor::new("sum", LogicalType::BigInt, Value::Null)]
    }

    fn state_layout(&self) -> Vec<LogicalType> { vec![LogicalType::BigInt] }

    fn create_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> {
        Ok(Box::new(RowAccumulator::new(*self, args)))
    }

    fn create_grouped_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        Ok(Box::new(RowGroupedAccumulator::new(*self, args)))
    }
}

fn overflow() -> AggregationError {
    AggregationError::Function("sum: bigint overflow".into())
}

impl RowAggregation for SumImpl {
    fn input(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        let Some(x) = bigint(&args[0])? else { return Ok(()) };
        let next = match bigint(&state[0])? {
            None => x,
            Some(sum) => sum.checked_add(x).ok_or_else(overflow)?,
        };
        state[0] = Value::from(next);
        Ok(())
    }

    fn remove(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        let Some(x) = bigint(&args[0])? else { return Ok(()) };
        let sum = bigint(&state[0])?.unwrap_or(0);
        state[0] = Value::from(sum.checked_sub(x).ok_or_else(overflow)?);
        Ok(())
    }

    fn combine(&self, state: &mut [Value], other: &[Value], lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        self.input(state, other, lambdas)
    }

    fn output(&self, state: &[Value]) -> Result<Value, AggregationError> {
        Ok(state[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sum_ignores_nulls_and_stays_null_when_empty() {
        let mut state = vec![Value::Null];
        SumImpl.input(&mut state, &[Value::Null], &[]).unwrap();
        assert_eq!(SumImpl.output(&state).unwrap(), Value::Null);

        SumImpl.input(&mut state, &[json!(2)], &[]).unwrap();
        SumImpl.input(&mut state, &[json!(3)], &[]).unwrap();
        assert_eq!(SumImpl.output(&state).unwrap(), json!(5));
    }

    #[test]
    fn sum_overflow_is_a_data_error() {
        let mut state = vec![json!(i64::MAX)];
        let err = SumImpl.input(&mut state, &[json!(1)], &[]).unwrap_err();
        assert_eq!(err, AggregationError::Function("sum: bigint overflow".into()));
        assert_eq!(state, vec![json!(i64::MAX)]);
    }

    #[test]
    fn retracting_everything_leaves_zero() {
        let mut state = vec![Value::Null];
        SumImpl.input(&mut state, &[json!(3)], &[]).unwrap();
        SumImpl.remove(&mut state, &[json!(3)], &[]).unwrap();
        assert_eq!(SumImpl.output(&state).unwrap(), json!(0));

        SumImpl.remove(&mut state, &[Value::Null], &[]).unwrap();
        assert_eq!(SumImpl.output(&state).unwrap(), json!(0));
    }

    #[test]
    fn sum_rejects_non_integers() {
        let mut state = vec![Value::Null];
        let err = SumImpl.input(&mut state, &[json!("3")], &[]).unwrap_err();
        assert!(matches!(err, AggregationError::TypeMismatch { expected: LogicalType::BigInt, .. }));
    }
}
