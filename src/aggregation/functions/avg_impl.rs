use serde_json::Value;

use crate::{
    aggregation::{
        Accumulator, AccumulatorArgs, AccumulatorStateDescriptor, AccumulatorTraits,
        AggregateImpl, AggregationError, GroupedAccumulator, LambdaProvider, RowAccumulator, RowAggregation,
        RowGroupedAccumulator,
    },
    aggregation::functions::row_aggregation::{bigint, checked_bigint_add, double, finite},
    types::LogicalType,
};

/// `avg(double)`: running sum and count; null when nothing was counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvgImpl;

impl AggregateImpl for AvgImpl {
    fn name(&self) -> &'static str { "avg" }

    fn input_arity(&self) -> usize { 1 }

    fn traits(&self) -> AccumulatorTraits { AccumulatorTraits::removable() }

    fn state_descriptors(&self) -> Vec<AccumulatorStateDescriptor> {
        vec![
            AccumulatorStateDescriptor::new("sum", LogicalType::Double, Value::from(0.0)),
            AccumulatorStateDescriptor::new("count", LogicalType::BigInt, Value::from(0)),
        ]
    }

    fn state_layout(&self) -> Vec<LogicalType> { vec![LogicalType::Double, LogicalType::BigInt] }

    fn create_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> {
        Ok(Box::new(RowAccumulator::new(*self, args)))
    }

    fn create_grouped_accumulator(&self, args: AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> {
        Ok(Box::new(RowGroupedAccumulator::new(*self, args)))
    }
}

impl AvgImpl {
    fn shift(&self, state: &mut [Value], sum: f64, count: i64) -> Result<(), AggregationError> {
        let current_sum = double(&state[0])?.unwrap_or(0.0);
        let current_count = bigint(&state[1])?.unwrap_or(0);
        let next_sum = finite(self.name(), current_sum + sum)?;
        let next_count = checked_bigint_add(self.name(), current_count, count)?;
        state[0] = next_sum;
        state[1] = Value::from(next_count);
        Ok(())
    }
}

impl RowAggregation for AvgImpl {
    fn input(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        match double(&args[0])? {
            Some(x) => self.shift(state, x, 1),
            None => Ok(()),
        }
    }

    fn remove(&self, state: &mut [Value], args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        match double(&args[0])? {
            Some(x) => self.shift(state, -x, -1),
            None => Ok(()),
        }
    }

    fn combine(&self, state: &mut [Value], other: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        let sum = double(&other[0])?.unwrap_or(0.0);
        let count = bigint(&other[1])?.unwrap_or(0);
        self.shift(state, sum, count)
    }

    fn output(&self, state: &[Value]) -> Result<Value, AggregationError> {
        let count = bigint(&state[1])?.unwrap_or(0);
        if count == 0 {
            return Ok(Value::Null);
        }
        let sum = double(&state[0])?.unwrap_or(0.0);
        finite(self.name(), sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn avg_ignores_null_and_returns_double() {
        let mut state = vec![json!(0.0), json!(0)];
        for v in [Value::Null, json!(2), json!(3.0)] {
            AvgImpl.input(&mut state, &[v], &[]).unwrap();
        }
        assert_eq!(AvgImpl.output(&state).unwrap(), json!(2.5));
    }

    #[test]
    fn avg_of_nothing_is_null() {
        let state = vec![json!(0.0), json!(0)];
        assert_eq!(AvgImpl.output(&state).unwrap(), Value::Null);
    }

    #[test]
    fn avg_combines_partials() {
        let mut left = vec![json!(3.0), json!(2)];
        AvgImpl.combine(&mut left, &[json!(6.0), json!(1)], &[]).unwrap();
        assert_eq!(AvgImpl.output(&left).unwrap(), json!(3.0));
    }

    #[test]
    fn count_overflow_in_partials_is_reported() {
        let mut state = vec![json!(1.0), json!(i64::MAX)];
        let err = AvgImpl.combine(&mut state, &[json!(1.0), json!(1)], &[]).unwrap_err();
        assert_eq!(err, AggregationError::Function("avg: bigint overflow".into()));
        assert_eq!(state, vec![json!(1.0), json!(i64::MAX)]);
    }
}
