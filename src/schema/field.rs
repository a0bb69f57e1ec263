//! Tag-checked field extraction from JSON-Schema objects.
//!
//! Every lookup is total: a missing key and a key holding the wrong JSON type
//! both come back as `None`.

use serde_json::{Map, Value};

/// A Rust value that can be read out of a single JSON value of one tag.
pub trait FromField: Sized {
    fn from_field(value: &Value) -> Option<Self>;
}

impl FromField for String {
    fn from_field(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromField for bool {
    fn from_field(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromField for f64 {
    fn from_field(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

/// Integers truncate toward zero when the source number has a fraction.
impl FromField for i64 {
    fn from_field(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            _ => None,
        }
    }
}

/// Arrays keep only the elements of the expected tag, in order.
impl<T: FromField> FromField for Vec<T> {
    fn from_field(value: &Value) -> Option<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(T::from_field).collect())
    }
}

/// Read `key` from `fields` as `T`
pub fn field<T: FromField>(fields: &Map<String, Value>, key: &str) -> Option<T> {
    fields.get(key).and_then(T::from_field)
}

/// Read `key` as a nested JSON object
pub fn object<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    fields.get(key).and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_tag_mismatch_is_absent() {
        let f = fields(json!({
            "pattern": 12,
            "required": "name",
            "uniqueItems": "yes",
            "minimum": "0"
        }));
        assert_eq!(field::<String>(&f, "pattern"), None);
        assert_eq!(field::<Vec<String>>(&f, "required"), None);
        assert_eq!(field::<bool>(&f, "uniqueItems"), None);
        assert_eq!(field::<f64>(&f, "minimum"), None);
        assert_eq!(field::<i64>(&f, "minimum"), None);
        assert_eq!(field::<String>(&f, "missing"), None);
    }

    #[test]
    fn test_string_list_skips_other_tags() {
        let f = fields(json!({"enum": ["a", 1, null, "b", {"c": 1}]}));
        assert_eq!(
            field::<Vec<String>>(&f, "enum"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_integer_truncation() {
        let f = fields(json!({"a": 2.7, "b": -2.7, "c": 9007199254740993_i64, "d": 5}));
        assert_eq!(field::<i64>(&f, "a"), Some(2));
        assert_eq!(field::<i64>(&f, "b"), Some(-2));
        assert_eq!(field::<i64>(&f, "c"), Some(9007199254740993));
        assert_eq!(field::<i64>(&f, "d"), Some(5));
        assert_eq!(field::<f64>(&f, "d"), Some(5.0));
    }

    #[test]
    fn test_object_lookup() {
        let f = fields(json!({"items": {"type": "string"}, "properties": []}));
        assert!(object(&f, "items").is_some());
        assert!(object(&f, "properties").is_none());
    }
}
