use std::{fmt::{self, Display}, sync::Arc};

use crate::{
    aggregation::{Accumulator, AccumulatorStateDescriptor, AggregationError, GroupedAccumulator, LambdaProvider},
    types::LogicalType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorKind {
    Scalar,
    Grouped,
}

impl Display for AccumulatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccumulatorKind::Scalar => f.write_str("scalar"),
            AccumulatorKind::Grouped => f.write_str("grouped"),
        }
    }
}

/// The fixed argument tuple every accumulator constructor receives.
#[derive(Debug, Clone)]
pub struct AccumulatorArgs {
    pub state_descriptors: Arc<[AccumulatorStateDescriptor]>,
    pub input_channels: Vec<usize>,
    pub mask_channel: Option<usize>,
    pub lambda_providers: Vec<LambdaProvider>,
}

/// What a constructor expects from that tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorShape {
    /// State slot types the accumulator reads and writes, in slot order.
    pub state_types: Vec<LogicalType>,
    pub input_arity: usize,
    pub lambda_count: usize,
}

impl ConstructorShape {
    pub fn new(state_types: Vec<LogicalType>, input_arity: usize) -> Self {
        Self { state_types, input_arity, lambda_count: 0 }
    }

    pub fn with_lambdas(mut self, lambda_count: usize) -> Self {
        self.lambda_count = lambda_count;
        self
    }
}

pub type ScalarConstructor = Arc<dyn Fn(AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> + Send + Sync>;
pub type GroupedConstructor = Arc<dyn Fn(AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> + Send + Sync>;

/// One way of building accumulators for a function.
///
/// A binder needs exactly one capability of each kind.
#[derive(Clone)]
pub enum ConstructionCapability {
    Scalar { shape: ConstructorShape, construct: ScalarConstructor },
    Grouped { shape: ConstructorShape, construct: GroupedConstructor },
}

impl ConstructionCapability {
    pub fn scalar(
        shape: ConstructorShape,
        construct: impl Fn(AccumulatorArgs) -> Result<Box<dyn Accumulator>, AggregationError> + Send + Sync + 'static,
    ) -> Self {
        ConstructionCapability::Scalar { shape, construct: Arc::new(construct) }
    }

    pub fn grouped(
        shape: ConstructorShape,
        construct: impl Fn(AccumulatorArgs) -> Result<Box<dyn GroupedAccumulator>, AggregationError> + Send + Sync + 'static,
    ) -> Self {
        ConstructionCapability::Grouped { shape, construct: Arc::new(construct) }
    }

    pub fn kind(&self) -> AccumulatorKind {
        match self {
            ConstructionCapability::Scalar { .. } => AccumulatorKind::Scalar,
            ConstructionCapability::Grouped { .. } => AccumulatorKind::Grouped,
        }
    }

    pub fn shape(&self) -> &ConstructorShape {
        match self {
            ConstructionCapability::Scalar { shape, .. } | ConstructionCapability::Grouped { shape, .. } => shape,
        }
    }
}

impl fmt::Debug for ConstructionCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.shape())
    }
}

/// Static capabilities of an aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorTraits {
    /// The scalar accumulator can retract input (sliding window frames).
    pub has_remove_input: bool,
    /// DISTINCT may be applied to the function's arguments.
    pub distinct_compatible: bool,
}

impl Default for AccumulatorTraits {
    fn default() -> Self {
        Self { has_remove_input: false, distinct_compatible: true }
    }
}

impl AccumulatorTraits {
    pub fn removable() -> Self {
        Self { has_remove_input: true, ..Self::default() }
    }

    pub fn without_distinct(mut self) -> Self {
        self.distinct_compatible = false;
        self
    }
}
