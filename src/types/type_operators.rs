use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::{aggregation::AggregationError, types::{LogicalType, SortOrder, ValueKey}};

/// Equality, hashing and ordering for cells of a given [`LogicalType`].
///
/// Used by the distinct and ordering decorations; it never looks at a cell
/// without knowing its declared type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeOperators;

impl TypeOperators {
    pub fn new() -> Self { Self }

    /// Map a cell to its hash key, validating it against `ty`.
    pub fn hash_key(&self, ty: LogicalType, v: &Value) -> Result<ValueKey, AggregationError> {
        let mismatch = || AggregationError::TypeMismatch { expected: ty, got: v.clone() };
        if v.is_null() {
            return Ok(ValueKey::Null);
        }
        match ty {
            LogicalType::Boolean => v.as_bool().map(ValueKey::Bool).ok_or_else(mismatch),
            LogicalType::BigInt => v.as_i64().map(ValueKey::Int).ok_or_else(mismatch),
            LogicalType::Double => v.as_f64().map(ValueKey::double).ok_or_else(mismatch),
            LogicalType::Varchar => v.as_str().map(|s| ValueKey::Text(s.to_string())).ok_or_else(mismatch),
            LogicalType::Json => Ok(ValueKey::json(v)),
        }
    }

    /// SQL `IS NOT DISTINCT FROM`: nulls are equal to each other.
    pub fn is_not_distinct(&self, ty: LogicalType, a: &Value, b: &Value) -> Result<bool, AggregationError> {
        Ok(self.hash_key(ty, a)? == self.hash_key(ty, b)?)
    }

    /// Compare two cells honoring direction and null placement of `order`.
    pub fn compare(&self, ty: LogicalType, a: &Value, b: &Value, order: SortOrder) -> Result<Ordering, AggregationError> {
        match (a.is_null(), b.is_null()) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(if order.is_nulls_first() { Ordering::Less } else { Ordering::Greater }),
            (false, true) => return Ok(if order.is_nulls_first() { Ordering::Greater } else { Ordering::Less }),
            (false, false) => {}
        }

        let ord = match ty {
            // integral cells are legal in double columns
            LogicalType::Double => {
                let x = a.as_f64().ok_or_else(|| AggregationError::TypeMismatch { expected: ty, got: a.clone() })?;
                let y = b.as_f64().ok_or_else(|| AggregationError::TypeMismatch { expected: ty, got: b.clone() })?;
                OrderedFloat(x).cmp(&OrderedFloat(y))
            }
            _ => self.hash_key(ty, a)?.cmp(&self.hash_key(ty, b)?),
        };
        Ok(if order.is_ascending() { ord } else { ord.reverse() })
    }
}
