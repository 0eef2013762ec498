use serde_json::Value;

use crate::{aggregation::AggregationError, page::Page};

/// Running state of one aggregate over all rows of one operator instance.
///
/// The executor will:
///   1) call `add_input` (and, for sliding frames, `remove_input`) per page
///   2) optionally fold in partial results with `add_intermediate` / `merge`
///   3) call `evaluate_final` once input is complete
///
/// Instances are owned by one thread; nothing here is synchronized.
pub trait Accumulator: Send {
    /// Function name, used in error messages.
    fn name(&self) -> &str;

    fn estimated_size(&self) -> usize;

    fn add_input(&mut self, page: &Page) -> Result<(), AggregationError>;

    /// Retract rows previously passed to `add_input`.
    fn remove_input(&mut self, _page: &Page) -> Result<(), AggregationError> {
        AggregationError::RemoveInputNotSupported(self.name().to_string()).err()
    }

    /// Fold a value produced by `evaluate_intermediate` into this state.
    fn add_intermediate(&mut self, state: &Value) -> Result<(), AggregationError>;

    fn evaluate_intermediate(&self) -> Result<Value, AggregationError>;

    fn evaluate_final(&mut self) -> Result<Value, AggregationError>;

    fn merge(&mut self, other: &dyn Accumulator) -> Result<(), AggregationError> {
        let state = other.evaluate_intermediate()?;
        self.add_intermediate(&state)
    }
}
