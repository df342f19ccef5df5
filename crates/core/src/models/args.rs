//! Event argument shapes and their flattened text form.

use serde_json::{Map, Number, Value};

/// A non-composite top-level argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

/// Event arguments, classified by top-level shape.
#[derive(Debug, Clone, PartialEq)]
pub enum EventArgs {
    Absent,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(Map<String, Value>),
}

impl EventArgs {
    /// Flatten the arguments into printable strings.
    ///
    /// - absent: no strings
    /// - bare string: that string alone
    /// - bare bool/number: no strings
    /// - sequence or mapping: one string per element/value, in order, where
    ///   strings pass through, composites become compact JSON with an
    ///   enclosing quote pair stripped, and other scalars use their JSON text
    pub fn to_args_str(&self) -> Vec<String> {
        match self {
            EventArgs::Absent => Vec::new(),
            EventArgs::Scalar(Scalar::String(s)) => vec![s.clone()],
            EventArgs::Scalar(Scalar::Bool(_) | Scalar::Number(_)) => Vec::new(),
            EventArgs::Sequence(items) => items.iter().map(value_to_text).collect(),
            EventArgs::Mapping(fields) => fields.values().map(value_to_text).collect(),
        }
    }
}

impl From<Value> for EventArgs {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => EventArgs::Absent,
            Value::Bool(b) => EventArgs::Scalar(Scalar::Bool(b)),
            Value::Number(n) => EventArgs::Scalar(Scalar::Number(n)),
            Value::String(s) => EventArgs::Scalar(Scalar::String(s)),
            Value::Array(items) => EventArgs::Sequence(items),
            Value::Object(fields) => EventArgs::Mapping(fields),
        }
    }
}

impl From<Option<Value>> for EventArgs {
    fn from(value: Option<Value>) -> Self {
        value.map_or(EventArgs::Absent, EventArgs::from)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            strip_enclosing_quotes(&integral_floats_as_integers(value).to_string())
        }
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_text(n),
    }
}

/// Integral floats print without a fractional part (`1.0` is `1`).
fn number_to_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f}")
            }
        }
        _ => n.to_string(),
    }
}

fn integral_floats_as_integers(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(float_to_integer(n).unwrap_or_else(|| n.clone())),
        Value::Array(items) => Value::Array(items.iter().map(integral_floats_as_integers).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), integral_floats_as_integers(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn float_to_integer(n: &Number) -> Option<Number> {
    // 2^63, exactly representable; `as i64` is exact below it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    let f = n.as_f64().filter(|f| n.is_f64() && f.fract() == 0.0)?;
    (-LIMIT..LIMIT).contains(&f).then(|| Number::from(f as i64))
}

fn strip_enclosing_quotes(s: &str) -> String {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args_str(value: Option<Value>) -> Vec<String> {
        EventArgs::from(value).to_args_str()
    }

    #[test]
    fn absent_args_flatten_to_nothing() {
        assert!(args_str(None).is_empty());
        assert!(args_str(Some(Value::Null)).is_empty());
    }

    #[test]
    fn sequence_keeps_strings_and_serializes_composites() {
        let out = args_str(Some(json!(["hello", {"x": 1}])));
        assert_eq!(out, vec!["hello".to_string(), "{\"x\":1}".to_string()]);
    }

    #[test]
    fn sequence_textualizes_other_scalars() {
        let out = args_str(Some(json!([null, true, 42, 1.5, [1, "a"]])));
        assert_eq!(out, vec!["null", "true", "42", "1.5", "[1,\"a\"]"]);
    }

    #[test]
    fn integral_floats_print_as_integers() {
        let out = args_str(Some(json!([1.0, -3.0, -0.0, 2.5, 1e20, {"a": 2.0, "b": [4.0, 0.25]}])));
        assert_eq!(
            out,
            vec![
                "1",
                "-3",
                "0",
                "2.5",
                "100000000000000000000",
                "{\"a\":2,\"b\":[4,0.25]}",
            ]
        );

        let value: Value = serde_json::from_str(r#"{"fee": 1.0, "rate": 2.50}"#).unwrap();
        assert_eq!(args_str(Some(value)), vec!["1", "2.5"]);
    }

    #[test]
    fn bare_string_is_single_element() {
        assert_eq!(args_str(Some(json!("solo"))), vec!["solo".to_string()]);
    }

    #[test]
    fn bare_non_string_scalars_contribute_nothing() {
        assert!(args_str(Some(json!(7))).is_empty());
        assert!(args_str(Some(json!(false))).is_empty());
    }

    #[test]
    fn mapping_values_in_insertion_order() {
        let value: Value = serde_json::from_str(r#"{"b": {"c": 2}, "a": 1, "s": "x"}"#).unwrap();
        assert_eq!(args_str(Some(value)), vec!["{\"c\":2}", "1", "x"]);

        let out = args_str(Some(json!({"a": 1, "b": {"c": 2}})));
        assert_eq!(out, vec!["1".to_string(), "{\"c\":2}".to_string()]);
    }

    #[test]
    fn strip_removes_one_quote_pair_only() {
        assert_eq!(strip_enclosing_quotes("\"abc\""), "abc");
        assert_eq!(strip_enclosing_quotes("\"\"abc\"\""), "\"abc\"");
        assert_eq!(strip_enclosing_quotes("{\"x\":1}"), "{\"x\":1}");
    }
}
