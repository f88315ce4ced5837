// Record payloads and their single-line text form

use crate::error::{Result, RotateError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A payload to persist as one line of the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Record {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Structured object or array, serialized as compact JSON
    Object(Value),
    /// Raw bytes, accepted only when they are valid UTF-8
    Bytes(Vec<u8>),
}

impl Record {
    /// Map a JSON value onto a record
    ///
    /// `null` is an absent payload and yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Record::Boolean(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Record::Integer(i)),
                None => n.as_f64().map(Record::Float),
            },
            Value::String(s) => Some(Record::Text(s)),
            value @ (Value::Array(_) | Value::Object(_)) => Some(Record::Object(value)),
        }
    }

    /// Normalize the record into a single line of text without terminator
    pub fn to_line(&self) -> Result<String> {
        let text = match self {
            Record::Text(s) => s.clone(),
            Record::Integer(i) => i.to_string(),
            Record::Float(f) => format_float(*f),
            Record::Boolean(b) => b.to_string(),
            Record::Object(value) => serde_json::to_string(value)
                .map_err(|e| RotateError::UnsupportedPayload(format!("Failed to serialize object: {}", e)))?,
            Record::Bytes(bytes) => String::from_utf8(bytes.clone())
                .map_err(|e| RotateError::UnsupportedPayload(format!("Payload is not UTF-8: {}", e)))?,
        };

        Ok(escape_line_breaks(&text))
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        f.to_string()
    }
}

/// Escape CR and LF so one record always occupies one line
fn escape_line_breaks(text: &str) -> String {
    if !text.contains(['\n', '\r']) {
        return text.to_string();
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl From<String> for Record {
    fn from(s: String) -> Self {
        Record::Text(s)
    }
}

impl From<&str> for Record {
    fn from(s: &str) -> Self {
        Record::Text(s.to_string())
    }
}

impl From<i64> for Record {
    fn from(i: i64) -> Self {
        Record::Integer(i)
    }
}

impl From<f64> for Record {
    fn from(f: f64) -> Self {
        Record::Float(f)
    }
}

impl From<bool> for Record {
    fn from(b: bool) -> Self {
        Record::Boolean(b)
    }
}

impl From<Vec<u8>> for Record {
    fn from(bytes: Vec<u8>) -> Self {
        Record::Bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_passes_through() {
        let record = Record::from("10,20");
        assert_eq!(record.to_line().unwrap(), "10,20");
    }

    #[test]
    fn test_scalars_are_stringified() {
        assert_eq!(Record::from(42i64).to_line().unwrap(), "42");
        assert_eq!(Record::from(1.5f64).to_line().unwrap(), "1.5");
        assert_eq!(Record::from(2.0f64).to_line().unwrap(), "2");
        assert_eq!(Record::from(true).to_line().unwrap(), "true");
        assert_eq!(Record::Float(f64::NAN).to_line().unwrap(), "NaN");
        assert_eq!(Record::Float(f64::NEG_INFINITY).to_line().unwrap(), "-Infinity");
    }

    #[test]
    fn test_object_serializes_to_single_line() {
        let record = Record::Object(json!({"a": 1, "b": "x"}));
        assert_eq!(record.to_line().unwrap(), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn test_object_with_newline_in_value() {
        let record = Record::Object(json!({"msg": "two\nlines"}));
        let line = record.to_line().unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(line, r#"{"msg":"two\nlines"}"#);
    }

    #[test]
    fn test_text_line_breaks_are_escaped() {
        let line = Record::from("a\r\nb").to_line().unwrap();
        assert_eq!(line, "a\\r\\nb");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(Record::from(b"1,2".to_vec()).to_line().unwrap(), "1,2");

        let result = Record::from(vec![0xff, 0xfe]).to_line();
        assert!(matches!(result, Err(RotateError::UnsupportedPayload(_))));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Record::from_value(Value::Null), None);
        assert_eq!(Record::from_value(json!(7)), Some(Record::Integer(7)));
        assert_eq!(Record::from_value(json!(0.25)), Some(Record::Float(0.25)));
        assert_eq!(Record::from_value(json!(false)), Some(Record::Boolean(false)));
        assert_eq!(
            Record::from_value(json!("x")),
            Some(Record::Text("x".to_string()))
        );
        assert_eq!(
            Record::from_value(json!([1, 2])),
            Some(Record::Object(json!([1, 2])))
        );
    }
}
