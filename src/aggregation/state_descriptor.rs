use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::types::LogicalType;

/// How the initial value of one state slot is produced.
#[derive(Clone)]
pub enum StateInitializer {
    Constant(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl StateInitializer {
    pub fn create(&self) -> Value {
        match self {
            StateInitializer::Constant(v) => v.clone(),
            StateInitializer::Factory(f) => f(),
        }
    }
}

impl PartialEq for StateInitializer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StateInitializer::Constant(a), StateInitializer::Constant(b)) => a == b,
            (StateInitializer::Factory(a), StateInitializer::Factory(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for StateInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateInitializer::Constant(v) => write!(f, "Constant({v})"),
            StateInitializer::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Declares one field of accumulator state.
///
/// Descriptors are ordered: the i-th descriptor describes the i-th slot of
/// every [`SingleState`](crate::aggregation::SingleState) and of every group
/// in a [`GroupedState`](crate::aggregation::GroupedState).
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorStateDescriptor {
    name: String,
    ty: LogicalType,
    initializer: StateInitializer,
}

impl AccumulatorStateDescriptor {
    pub fn new(name: &str, ty: LogicalType, initial: Value) -> Self {
        Self { name: name.to_string(), ty, initializer: StateInitializer::Constant(initial) }
    }

    pub fn with_factory(name: &str, ty: LogicalType, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self { name: name.to_string(), ty, initializer: StateInitializer::Factory(Arc::new(factory)) }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn ty(&self) -> LogicalType { self.ty }
    pub fn initializer(&self) -> &StateInitializer { &self.initializer }

    pub fn initial_value(&self) -> Value { self.initializer.create() }
}

/// Logical types of `descriptors`, in slot order.
pub fn state_types(descriptors: &[AccumulatorStateDescriptor]) -> Vec<LogicalType> {
    descriptors.iter().map(AccumulatorStateDescriptor::ty).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn factory_runs_on_every_initialization() {
        let d = AccumulatorStateDescriptor::with_factory("values", LogicalType::Json, || json!([]));
        let mut a = d.initial_value();
        a.as_array_mut().unwrap().push(json!(1));
        assert_eq!(d.initial_value(), json!([]));
    }

    #[test]
    fn descriptors_compare_by_shape_and_initializer() {
        let a = AccumulatorStateDescriptor::new("sum", LogicalType::BigInt, Value::Null);
        assert_eq!(a, a.clone());
        assert_ne!(a, AccumulatorStateDescriptor::new("sum", LogicalType::Double, Value::Null));
        assert_eq!(state_types(&[a]), vec![LogicalType::BigInt]);
    }
}
