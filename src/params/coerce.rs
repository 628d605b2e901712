use serde_json::Value;

use crate::meta::ValueType;

/// Convert a raw resolved value to the declared type.
///
/// Strings are parsed; JSON scalars must already match the target type,
/// except that numbers and booleans are accepted for `string`.
pub fn coerce(raw: Value, ty: ValueType) -> Result<Value, String> {
    match (ty, raw) {
        (ValueType::Json, v) => Ok(v),

        (ValueType::String, Value::String(s)) => Ok(Value::String(s)),
        (ValueType::String, v @ (Value::Number(_) | Value::Bool(_))) => {
            Ok(Value::String(v.to_string()))
        }

        (ValueType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("'{s}' is not an integer")),
        (ValueType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Ok(Value::Number(n))
        }

        (ValueType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("'{s}' is not a number")),
        (ValueType::Number, Value::Number(n)) => Ok(Value::Number(n)),

        (ValueType::Boolean, Value::String(s)) => s
            .trim()
            .parse::<bool>()
            .map(Value::from)
            .map_err(|_| format!("'{s}' is not a boolean")),
        (ValueType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),

        (ty, v) => Err(format!("{v} cannot be converted to {ty}")),
    }
}
