use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Column and state types understood by the aggregation layer.
///
/// Cells are carried as `serde_json::Value`; the logical type decides how a
/// cell is compared, hashed and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Boolean,
    BigInt,
    Double,
    Varchar,
    /// Arbitrary JSON (arrays, objects, opaque intermediate state).
    Json,
}

impl LogicalType {
    /// Whether `v` is a legal cell of this type. `null` is legal for every type.
    pub fn accepts(&self, v: &Value) -> bool {
        match (self, v) {
            (_, Value::Null) => true,
            (LogicalType::Boolean, Value::Bool(_)) => true,
            (LogicalType::BigInt, Value::Number(n)) => n.is_i64(),
            (LogicalType::Double, Value::Number(_)) => true,
            (LogicalType::Varchar, Value::String(_)) => true,
            (LogicalType::Json, _) => true,
            _ => false,
        }
    }

    pub fn is_orderable(&self) -> bool {
        !matches!(self, LogicalType::Json)
    }
}

impl Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalType::Boolean => "boolean",
            LogicalType::BigInt => "bigint",
            LogicalType::Double => "double",
            LogicalType::Varchar => "varchar",
            LogicalType::Json => "json",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_matches_value_shape() {
        assert!(LogicalType::BigInt.accepts(&json!(3)));
        assert!(!LogicalType::BigInt.accepts(&json!(3.5)));
        assert!(LogicalType::Double.accepts(&json!(3)));
        assert!(LogicalType::Varchar.accepts(&Value::Null));
        assert!(!LogicalType::Boolean.accepts(&json!("true")));
        assert!(LogicalType::Json.accepts(&json!({"a": [1]})));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_value(LogicalType::BigInt).unwrap(), json!("bigint"));
        let t: LogicalType = serde_json::from_value(json!("varchar")).unwrap();
        assert_eq!(t, LogicalType::Varchar);
    }
}
