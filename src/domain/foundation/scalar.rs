//! Scalar values for typed attribute maps (event data, client preferences).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A JSON-compatible scalar. Nested objects and arrays are not allowed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// String-keyed map of scalars.
pub type AttributeMap = BTreeMap<String, Scalar>;

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the value. Text is parsed when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }

    /// Text rendering used for substitution and string comparison.
    /// Null renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<u32> for Scalar {
    fn from(i: u32) -> Self {
        Scalar::Int(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_each_json_scalar() {
        let map: AttributeMap =
            serde_json::from_value(json!({"a": null, "b": true, "c": 3, "d": 2.5, "e": "x"}))
                .unwrap();
        assert_eq!(map["a"], Scalar::Null);
        assert_eq!(map["b"], Scalar::Bool(true));
        assert_eq!(map["c"], Scalar::Int(3));
        assert_eq!(map["d"], Scalar::Float(2.5));
        assert_eq!(map["e"], Scalar::Text("x".into()));
    }

    #[test]
    fn rejects_nested_values() {
        let result: Result<AttributeMap, _> = serde_json::from_value(json!({"a": {"b": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn numeric_text_has_numeric_view() {
        assert_eq!(Scalar::from("29.00").as_f64(), Some(29.0));
        assert_eq!(Scalar::from("abc").as_f64(), None);
        assert_eq!(Scalar::Null.as_f64(), None);
    }

    #[test]
    fn null_renders_empty() {
        assert_eq!(Scalar::Null.render(), "");
        assert_eq!(Scalar::Int(7).render(), "7");
    }
}
