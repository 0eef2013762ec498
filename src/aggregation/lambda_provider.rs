use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::aggregation::AggregationError;

pub type LambdaFn = dyn Fn(&[Value]) -> Result<Value, AggregationError> + Send + Sync;

/// A pre-compiled callable captured at the call site (e.g. the combine
/// function of `reduce_agg`). Passed to accumulators unchanged.
#[derive(Clone)]
pub struct LambdaProvider {
    name: String,
    function: Arc<LambdaFn>,
}

impl LambdaProvider {
    pub fn new(name: &str, function: impl Fn(&[Value]) -> Result<Value, AggregationError> + Send + Sync + 'static) -> Self {
        Self { name: name.to_string(), function: Arc::new(function) }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn call(&self, args: &[Value]) -> Result<Value, AggregationError> {
        (self.function)(args)
    }
}

impl fmt::Debug for LambdaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LambdaProvider({})", self.name)
    }
}
