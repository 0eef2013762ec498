use std::fmt::{self, Display};

use crate::{aggregation::AccumulatorKind, types::LogicalType};

/// Coarse classification of an [`AggregationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The function definition itself is broken; it must never be registered.
    Registration,
    /// The caller violated the bind/usage contract.
    CallSite,
    /// Input data could not be accumulated.
    Data,
    /// External resources (spill storage) failed.
    Operational,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationError {
    MissingConstructor { function: String, kind: AccumulatorKind },
    DuplicateConstructor { function: String, kind: AccumulatorKind },
    ConstructorShapeMismatch { function: String, kind: AccumulatorKind, expected: Vec<LogicalType>, got: Vec<LogicalType> },
    /// Scalar and grouped constructors read a different number of arguments.
    ConstructorArityMismatch { function: String, scalar: usize, grouped: usize },
    ConstructorLambdaMismatch { function: String, scalar: usize, grouped: usize },
    DuplicateFunction(String),

    FunctionNotFound(String),
    OrderingMismatch { channels: usize, orderings: usize },
    DistinctNotSupported(String),
    ArgumentCountMismatch { function: String, expected: usize, got: usize },
    LambdaCountMismatch { function: String, expected: usize, got: usize },
    RemoveInputNotSupported(String),
    IntermediateNotSupported(String),
    AccumulatorFinalized,
    NotPrepared,
    SpillNotEnabled,

    ChannelOutOfBounds { channel: usize, channels: usize },
    PageShapeMismatch { expected: usize, got: usize },
    GroupIdOutOfRange { group_id: usize, group_count: usize },
    TypeMismatch { expected: LogicalType, got: serde_json::Value },
    Function(String),

    Spill(String),
    SpillPending(usize),
}

impl AggregationError {
    pub fn category(&self) -> ErrorCategory {
        use AggregationError::*;
        match self {
            MissingConstructor { .. } | DuplicateConstructor { .. } | ConstructorShapeMismatch { .. }
            | ConstructorArityMismatch { .. } | ConstructorLambdaMismatch { .. }
            | DuplicateFunction(_) => ErrorCategory::Registration,
            FunctionNotFound(_) | OrderingMismatch { .. } | DistinctNotSupported(_)
            | ArgumentCountMismatch { .. } | LambdaCountMismatch { .. } | RemoveInputNotSupported(_)
            | IntermediateNotSupported(_) | AccumulatorFinalized | NotPrepared | SpillNotEnabled => ErrorCategory::CallSite,
            ChannelOutOfBounds { .. } | PageShapeMismatch { .. } | GroupIdOutOfRange { .. }
            | TypeMismatch { .. } | Function(_) => ErrorCategory::Data,
            Spill(_) | SpillPending(_) => ErrorCategory::Operational,
        }
    }

    pub fn err<T>(self) -> Result<T, AggregationError> {
        Err(self)
    }
}

impl Display for AggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AggregationError::*;
        match self {
            MissingConstructor { function, kind } =>
                write!(f, "aggregate '{function}' has no {kind} constructor"),
            DuplicateConstructor { function, kind } =>
                write!(f, "aggregate '{function}' declares more than one {kind} constructor"),
            ConstructorShapeMismatch { function, kind, expected, got } =>
                write!(f, "{kind} constructor of '{function}' expects state {got:?} but descriptors declare {expected:?}"),
            ConstructorArityMismatch { function, scalar, grouped } =>
                write!(f, "'{function}': scalar constructor takes {scalar} arguments but grouped constructor takes {grouped}"),
            ConstructorLambdaMismatch { function, scalar, grouped } =>
                write!(f, "'{function}': scalar constructor takes {scalar} lambdas but grouped constructor takes {grouped}"),
            DuplicateFunction(name) => write!(f, "aggregate '{name}' is already registered"),
            FunctionNotFound(name) => write!(f, "aggregate '{name}' is not registered"),
            OrderingMismatch { channels, orderings } =>
                write!(f, "{channels} order-by channels but {orderings} sort orders"),
            DistinctNotSupported(name) => write!(f, "aggregate '{name}' does not support DISTINCT"),
            ArgumentCountMismatch { function, expected, got } =>
                write!(f, "aggregate '{function}' takes {expected} arguments, got {got}"),
            LambdaCountMismatch { function, expected, got } =>
                write!(f, "aggregate '{function}' takes {expected} lambdas, got {got}"),
            RemoveInputNotSupported(name) => write!(f, "aggregate '{name}' does not support removing input"),
            IntermediateNotSupported(name) => write!(f, "aggregate '{name}' has no intermediate state in this configuration"),
            AccumulatorFinalized => f.write_str("accumulator already produced its final value"),
            NotPrepared => f.write_str("prepare_final must be called before evaluate_final"),
            SpillNotEnabled => f.write_str("spill is not enabled for this accumulator"),
            ChannelOutOfBounds { channel, channels } =>
                write!(f, "channel {channel} out of bounds for page with {channels} channels"),
            PageShapeMismatch { expected, got } =>
                write!(f, "expected {expected} positions, got {got}"),
            GroupIdOutOfRange { group_id, group_count } =>
                write!(f, "group id {group_id} out of range for {group_count} groups"),
            TypeMismatch { expected, got } => write!(f, "expected {expected}, got {got}"),
            Function(message) => f.write_str(message),
            Spill(message) => write!(f, "spill failed: {message}"),
            SpillPending(count) => write!(f, "{count} spilled partitions must be restored first"),
        }
    }
}

impl std::error::Error for AggregationError {}
