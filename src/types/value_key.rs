use ordered_float::OrderedFloat;
use serde_json::Value;

/// Hashable, totally ordered projection of a typed cell.
///
/// Doubles go through `OrderedFloat` so `NaN` and `-0.0` hash consistently;
/// JSON values that have no scalar representation fall back to their
/// canonical serialized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Int(i64),
    Double(OrderedFloat<f64>),
    Text(String),
    Json(String),
}

impl ValueKey {
    pub fn is_null(&self) -> bool { matches!(self, ValueKey::Null) }

    pub(crate) fn double(f: f64) -> Self {
        // -0.0 and 0.0 are the same distinct value
        ValueKey::Double(OrderedFloat(if f == 0.0 { 0.0 } else { f }))
    }

    pub(crate) fn json(v: &Value) -> Self {
        ValueKey::Json(v.to_string())
    }
}
