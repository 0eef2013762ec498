use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    aggregation::{
        Accumulator, AccumulatorArgs, AggregateImpl, AggregationError, GroupedAccumulator, GroupedState,
        LambdaProvider, SingleState,
    },
    page::{Block, GroupByIdBlock, Page},
    types::LogicalType,
};

/// Row-at-a-time aggregate math over a slice of state slots.
///
/// Implementors only describe how one row or one partial state changes the
/// slots; [`RowAccumulator`] and [`RowGroupedAccumulator`] handle channels,
/// masks, group ids and intermediate encoding.
pub trait RowAggregation: AggregateImpl + Clone + 'static {
    fn input(&self, state: &mut [Value], args: &[Value], lambdas: &[LambdaProvider]) -> Result<(), AggregationError>;

    fn remove(&self, _state: &mut [Value], _args: &[Value], _lambdas: &[LambdaProvider]) -> Result<(), AggregationError> {
        AggregationError::RemoveInputNotSupported(self.name().to_string()).err()
    }

    fn combine(&self, state: &mut [Value], other: &[Value], lambdas: &[LambdaProvider]) -> Result<(), AggregationError>;

    fn output(&self, state: &[Value]) -> Result<Value, AggregationError>;
}

type RowStep<A> = fn(&A, &mut [Value], &[Value], &[LambdaProvider]) -> Result<(), AggregationError>;

fn is_selected(page: &Page, mask_channel: Option<usize>, position: usize) -> Result<bool, AggregationError> {
    match mask_channel {
        None => Ok(true),
        Some(channel) => Ok(matches!(page.block(channel)?.get(position), Some(Value::Bool(true)))),
    }
}

/// Intermediate-step accumulators are built without input channels and must
/// not touch raw rows.
fn check_input_channels<A: RowAggregation>(aggregation: &A, input_channels: &[usize]) -> Result<(), AggregationError> {
    if input_channels.len() != aggregation.input_arity() {
        return AggregationError::ArgumentCountMismatch {
            function: aggregation.name().to_string(),
            expected: aggregation.input_arity(),
            got: input_channels.len(),
        }
        .err();
    }
    Ok(())
}

fn intermediate_slots<'a>(name: &str, width: usize, state: &'a Value) -> Result<&'a [Value], AggregationError> {
    match state.as_array() {
        Some(slots) if slots.len() == width => Ok(slots),
        _ => AggregationError::Function(format!("{name}: malformed intermediate state {state}")).err(),
    }
}

/// Scalar accumulator over a [`RowAggregation`].
///
/// A page is applied to a copy of the state and committed only if every row
/// succeeds.
#[derive(Debug, Clone)]
pub struct RowAccumulator<A: RowAggregation> {
    aggregation: A,
    state: SingleState,
    input_channels: Vec<usize>,
    mask_channel: Option<usize>,
    lambdas: Vec<LambdaProvider>,
}

impl<A: RowAggregation> RowAccumulator<A> {
    pub fn new(aggregation: A, args: AccumulatorArgs) -> Self {
        Self {
            aggregation,
            state: SingleState::new(&args.state_descriptors),
            input_channels: args.input_channels,
            mask_channel: args.mask_channel,
            lambdas: args.lambda_providers,
        }
    }

    fn apply(&mut self, page: &Page, step: RowStep<A>) -> Result<(), AggregationError> {
        check_input_channels(&self.aggregation, &self.input_channels)?;
        let mut next = self.state.clone();
        for position in 0..page.position_count() {
            if !is_selected(page, self.mask_channel, position)? {
                continue;
            }
            let row = page.row(&self.input_channels, position)?;
            step(&self.aggregation, next.slots_mut(), &row, &self.lambdas)?;
        }
        self.state = next;
        Ok(())
    }
}

impl<A: RowAggregation> Accumulator for RowAccumulator<A> {
    fn name(&self) -> &str { self.aggregation.name() }

    fn estimated_size(&self) -> usize { self.state.estimated_size() }

    fn add_input(&mut self, page: &Page) -> Result<(), AggregationError> {
        self.apply(page, A::input)
    }

    fn remove_input(&mut self, page: &Page) -> Result<(), AggregationError> {
        self.apply(page, A::remove)
    }

    fn add_intermediate(&mut self, state: &Value) -> Result<(), AggregationError> {
        let other = intermediate_slots(self.name(), self.state.slots().len(), state)?;
        let mut next = self.state.clone();
        self.aggregation.combine(next.slots_mut(), other, &self.lambdas)?;
        self.state = next;
        Ok(())
    }

    fn evaluate_intermediate(&self) -> Result<Value, AggregationError> {
        Ok(self.state.to_value())
    }

    fn evaluate_final(&mut self) -> Result<Value, AggregationError> {
        self.aggregation.output(self.state.slots())
    }
}

/// Grouped accumulator over a [`RowAggregation`].
///
/// Rows of one page are staged per touched group and written back together,
/// so a failing row leaves every group as it was.
#[derive(Debug, Clone)]
pub struct RowGroupedAccumulator<A: RowAggregation> {
    aggregation: A,
    state: GroupedState,
    input_channels: Vec<usize>,
    mask_channel: Option<usize>,
    lambdas: Vec<LambdaProvider>,
}

impl<A: RowAggregation> RowGroupedAccumulator<A> {
    pub fn new(aggregation: A, args: AccumulatorArgs) -> Self {
        Self {
            aggregation,
            state: GroupedState::new(args.state_descriptors),
            input_channels: args.input_channels,
            mask_channel: args.mask_channel,
            lambdas: args.lambda_providers,
        }
    }

    fn stage<'a>(&self, staged: &'a mut IndexMap<usize, Vec<Value>>, group_id: usize) -> Result<&'a mut Vec<Value>, AggregationError> {
        if !staged.contains_key(&group_id) {
            staged.insert(group_id, self.state.group(group_id)?.to_vec());
        }
        staged.get_mut(&group_id).ok_or(AggregationError::GroupIdOutOfRange { group_id, group_count: self.state.group_count() })
    }

    fn commit(&mut self, staged: IndexMap<usize, Vec<Value>>) -> Result<(), AggregationError> {
        for (group_id, slots) in staged {
            self.state.group_mut(group_id)?.clone_from_slice(&slots);
        }
        Ok(())
    }

    fn apply(&mut self, group_ids: &GroupByIdBlock, page: &Page, step: RowStep<A>) -> Result<(), AggregationError> {
        if group_ids.position_count() != page.position_count() {
            return AggregationError::PageShapeMismatch { expected: page.position_count(), got: group_ids.position_count() }.err();
        }
        check_input_channels(&self.aggregation, &self.input_channels)?;
        self.state.ensure_capacity(group_ids.group_count());

        let mut staged = IndexMap::new();
        for (position, group_id) in group_ids.group_ids().iter().enumerate() {
            if !is_selected(page, self.mask_channel, position)? {
                continue;
            }
            let row = page.row(&self.input_channels, position)?;
            let slots = self.stage(&mut staged, *group_id)?;
            step(&self.aggregation, slots, &row, &self.lambdas)?;
        }
        self.commit(staged)
    }
}

impl<A: RowAggregation> GroupedAccumulator for RowGroupedAccumulator<A> {
    fn name(&self) -> &str { self.aggregation.name() }

    fn estimated_size(&self) -> usize { self.state.estimated_size() }

    fn group_count(&self) -> usize { self.state.group_count() }

    fn add_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        self.apply(group_ids, page, A::input)
    }

    fn remove_input(&mut self, group_ids: &GroupByIdBlock, page: &Page) -> Result<(), AggregationError> {
        self.apply(group_ids, page, A::remove)
    }

    fn add_intermediate(&mut self, group_ids: &GroupByIdBlock, states: &Block) -> Result<(), AggregationError> {
        if group_ids.position_count() != states.len() {
            return AggregationError::PageShapeMismatch { expected: states.len(), got: group_ids.position_count() }.err();
        }
        self.state.ensure_capacity(group_ids.group_count());

        let mut staged = IndexMap::new();
        for (group_id, state) in group_ids.group_ids().iter().zip(states.iter()) {
            let other = intermediate_slots(self.name(), self.state.width(), state)?;
            let slots = self.stage(&mut staged, *group_id)?;
            self.aggregation.combine(slots, other, &self.lambdas)?;
        }
        self.commit(staged)
    }

    fn evaluate_intermediate(&self, group_id: usize) -> Result<Value, AggregationError> {
        Ok(Value::Array(self.state.group(group_id)?.to_vec()))
    }

    fn evaluate_final(&self, group_id: usize) -> Result<Value, AggregationError> {
        self.aggregation.output(self.state.group(group_id)?)
    }
}

/// `null` → `None`; anything but an integral number is a type error.
pub(crate) fn bigint(v: &Value) -> Result<Option<i64>, AggregationError> {
    match v {
        Value::Null => Ok(None),
        _ => v.as_i64().map(Some).ok_or_else(|| AggregationError::TypeMismatch { expected: LogicalType::BigInt, got: v.clone() }),
    }
}

pub(crate) fn double(v: &Value) -> Result<Option<f64>, AggregationError> {
    match v {
        Value::Null => Ok(None),
        _ => v.as_f64().map(Some).ok_or_else(|| AggregationError::TypeMismatch { expected: LogicalType::Double, got: v.clone() }),
    }
}

pub(crate) fn checked_bigint_add(function: &str, a: i64, b: i64) -> Result<i64, AggregationError> {
    a.checked_add(b).ok_or_else(|| AggregationError::Function(format!("{function}: bigint overflow")))
}

pub(crate) fn finite(function: &str, f: f64) -> Result<Value, AggregationError> {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| AggregationError::Function(format!("{function}: double overflow")))
}

pub(crate) fn lambda<'a>(function: &str, lambdas: &'a [LambdaProvider], index: usize) -> Result<&'a LambdaProvider, AggregationError> {
    lambdas.get(index).ok_or_else(|| AggregationError::LambdaCountMismatch {
        function: function.to_string(),
        expected: index + 1,
        got: lambdas.len(),
    })
}
