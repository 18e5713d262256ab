//! Conversions to the canonical in-memory representation of primitive kinds
//!
//! Each kind accepts an explicit set of source representations. Anything
//! else is rejected with a reason string.

use crate::field::Kind;
use crate::time;
use crate::value::Value;

/// True if `value` already has the canonical type for `kind`
pub(crate) fn is_canonical(kind: &Kind, value: &Value) -> bool {
    matches!(
        (kind, value),
        (Kind::Bool, Value::Bool(_))
            | (Kind::Int, Value::Int(_))
            | (Kind::Float, Value::Float(_))
            | (Kind::String, Value::String(_))
            | (Kind::Timestamp, Value::Float(_))
    )
}

/// Convert `value` to the canonical type for the primitive `kind`
pub(crate) fn regularize(kind: &Kind, value: &Value) -> Result<Value, String> {
    match kind {
        Kind::Bool => to_bool(value),
        Kind::Int => to_int(value),
        Kind::Float => to_float(value),
        Kind::String => to_string(value),
        Kind::Timestamp => to_timestamp(value),
        other => Err(format!("{} is not a primitive kind", other.name())),
    }
}

fn unsupported(value: &Value) -> String {
    format!("no conversion from {}", value.type_name())
}

fn to_bool(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        Value::String(_) => Err("expected true or false".to_string()),
        other => Err(unsupported(other)),
    }
}

fn to_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(x) => {
            if x.is_finite() && x.fract() == 0.0 && *x >= i64::MIN as f64 && *x < i64::MAX as f64 {
                Ok(Value::Int(*x as i64))
            } else {
                Err("float has a fractional part or is out of range".to_string())
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|e| e.to_string()),
        other => Err(unsupported(other)),
    }
}

fn to_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|e| e.to_string()),
        other => Err(unsupported(other)),
    }
}

fn to_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(Value::String(value.to_string())),
        other => Err(unsupported(other)),
    }
}

fn to_timestamp(value: &Value) -> Result<Value, String> {
    match value {
        Value::Float(t) => Ok(Value::Float(*t)),
        Value::Int(t) => Ok(Value::Float(*t as f64)),
        Value::DateTime(dt) => Ok(Value::Float(time::datetime_to_time(dt))),
        Value::String(s) => time::parse_timestamp(s)
            .map(Value::Float)
            .map_err(|e| e.to_string()),
        other => Err(unsupported(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn int_from_float_requires_integral() {
        assert_eq!(to_int(&Value::Float(4.0)), Ok(Value::Int(4)));
        assert!(to_int(&Value::Float(4.5)).is_err());
        assert!(to_int(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn string_to_number() {
        assert_eq!(to_float(&Value::from(" 2.5")), Ok(Value::Float(2.5)));
        assert_eq!(to_int(&Value::from("42")), Ok(Value::Int(42)));
        assert!(to_float(&Value::from("abc")).is_err());
    }

    #[test]
    fn bool_from_text() {
        assert_eq!(to_bool(&Value::from("TRUE")), Ok(Value::Bool(true)));
        assert!(to_bool(&Value::from("yes")).is_err());
        assert!(to_bool(&Value::Int(1)).is_err());
    }

    #[test]
    fn timestamp_sources_agree() {
        let dt = NaiveDate::from_ymd_opt(2009, 2, 13)
            .unwrap()
            .and_hms_milli_opt(23, 31, 30, 500)
            .unwrap();

        let expected = Value::Float(1234567890.5);
        assert_eq!(to_timestamp(&Value::Float(1234567890.5)), Ok(expected.clone()));
        assert_eq!(to_timestamp(&Value::DateTime(dt)), Ok(expected.clone()));
        assert_eq!(to_timestamp(&Value::from("2009-02-13T23:31:30.5")), Ok(expected));
        assert_eq!(to_timestamp(&Value::Int(10)), Ok(Value::Float(10.0)));
        assert!(to_timestamp(&Value::Bool(true)).is_err());
    }

    #[test]
    fn containers_are_not_primitive() {
        let kind = Kind::List {
            content: Box::new(crate::field::Field::float()),
        };
        assert!(regularize(&kind, &Value::Float(1.0)).is_err());
    }
}
