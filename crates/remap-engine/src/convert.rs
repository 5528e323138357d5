//! The primitive value-conversion collaborator.

use remap_model::{TypeRegistry, Value, ValueType};

/// Converts scalar values between declared types.
///
/// A failed conversion is "no value available" (`None`), never an error;
/// the fallback chain then moves on to its next candidate.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, value: &Value, target: &ValueType) -> Option<Value>;
}

/// The stock converter: int/float widening and narrowing, parsing and
/// formatting of text, bool round-trips.
#[derive(Debug, Default)]
pub struct StandardConverter;

impl ValueConverter for StandardConverter {
    fn convert(&self, value: &Value, target: &ValueType) -> Option<Value> {
        match (value, target) {
            (Value::Int(v), ValueType::Float) => Some(Value::Float(*v as f64)),
            (Value::Float(v), ValueType::Int) if v.fract() == 0.0 => Some(Value::Int(*v as i64)),
            (Value::Int(v), ValueType::Text) => Some(Value::Text(v.to_string())),
            (Value::Float(v), ValueType::Text) => Some(Value::Text(v.to_string())),
            (Value::Bool(v), ValueType::Text) => Some(Value::Text(v.to_string())),
            (Value::Bool(v), ValueType::Int) => Some(Value::Int(i64::from(*v))),
            (Value::Text(v), ValueType::Int) => v.trim().parse().ok().map(Value::Int),
            (Value::Text(v), ValueType::Float) => v.trim().parse().ok().map(Value::Float),
            (Value::Text(v), ValueType::Bool) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Whether a value already fits a declared type without conversion.
pub(crate) fn fits_type(value: &Value, declared: &ValueType, types: &TypeRegistry) -> bool {
    match (value, declared) {
        (Value::Null, _) => true,
        (Value::Bool(_), ValueType::Bool)
        | (Value::Int(_), ValueType::Int)
        | (Value::Float(_), ValueType::Float)
        | (Value::Text(_), ValueType::Text) => true,
        (Value::Object(object), ValueType::Object(declared_type)) => {
            types.is_assignable(declared_type, &object.type_name())
        }
        (Value::List(_), ValueType::List(_) | ValueType::Array(_)) => true,
        _ => false,
    }
}
