use itertools::Itertools;
use rust_decimal::Decimal;
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    str::FromStr,
};

const TRUE_TOKENS: [&str; 5] = ["1", "t", "T", "true", "TRUE"];
const FALSE_TOKENS: [&str; 5] = ["0", "f", "F", "false", "FALSE"];

/// A raw condition value as supplied by the caller.
///
/// Values arrive untyped (query parameters, decoded JSON) and are carried
/// through validation and formatting before they reach the compiled
/// expression. `Tuple` marks an array that appeared *inside* another array:
/// a row-value candidate for composite-key `in` conditions.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Whether this value belongs to the blank equivalence class: `NULL`, the
    /// empty string, or the empty collection. Nothing else is blank; notably
    /// `false` and `0` are not.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(value) => value.is_empty(),
            Self::Array(values) | Self::Tuple(values) => values.is_empty(),
            Self::Boolean(_) | Self::Integer(_) | Self::Decimal(_) => false,
        }
    }

    /// Interpret this value as a boolean token.
    ///
    /// Recognized truthy tokens are `true`, `1`, `"1"`, `"t"`, `"T"`,
    /// `"true"` and `"TRUE"`; falsy tokens are their counterparts. Anything
    /// else yields `None`.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            Self::Integer(1) => Some(true),
            Self::Integer(0) => Some(false),
            Self::String(value) if TRUE_TOKENS.contains(&value.as_str()) => Some(true),
            Self::String(value) if FALSE_TOKENS.contains(&value.as_str()) => Some(false),
            _ => None,
        }
    }

    /// The textual form used by pattern-building formatters.
    pub fn text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Boolean(value) => value.to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Array(values) | Self::Tuple(values) => {
                values.iter().map(Self::text).join(",")
            }
        }
    }

    /// Convert a decoded JSON value.
    ///
    /// Arrays nested inside an array become [`Value::Tuple`] so that
    /// composite-key `in` conditions keep their row-value shape. Numbers that
    /// fit neither `i64` nor [`Decimal`] fall back to their textual form.
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self::from_json_nested(value, false)
    }

    fn from_json_nested(value: &serde_json::Value, in_array: bool) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Boolean(*value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Self::Integer(value),
                None => Decimal::from_str(&number.to_string())
                    .map(Self::Decimal)
                    .unwrap_or_else(|_| Self::String(number.to_string())),
            },
            serde_json::Value::String(value) => Self::String(value.clone()),
            serde_json::Value::Array(values) => {
                let values = values
                    .iter()
                    .map(|value| Self::from_json_nested(value, true))
                    .collect();
                if in_array {
                    Self::Tuple(values)
                } else {
                    Self::Array(values)
                }
            }
            serde_json::Value::Object(_) => Self::String(value.to_string()),
        }
    }

    /// Ordering between two values, crossing the integer/decimal divide.
    /// Non-comparable pairs (booleans, nulls, collections, mixed kinds)
    /// yield `None`.
    pub(crate) fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Self::Decimal(a), Self::Integer(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality between two values, crossing the integer/decimal divide.
    pub(crate) fn equals(&self, other: &Self) -> bool {
        match self.compare(other) {
            Some(ordering) => ordering == Ordering::Equal,
            None => self == other,
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(formatter, "NULL"),
            Self::Boolean(value) => write!(formatter, "{value}"),
            Self::Integer(value) => write!(formatter, "{value}"),
            Self::Decimal(value) => write!(formatter, "{value}"),
            Self::String(value) => write!(formatter, "'{value}'"),
            Self::Array(values) | Self::Tuple(values) => {
                write!(formatter, "({})", values.iter().join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_empty_string_and_empty_collections_are_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::String(String::new()).is_blank());
        assert!(Value::Array(vec![]).is_blank());
        assert!(Value::Tuple(vec![]).is_blank());
    }

    #[test]
    fn false_and_zero_are_not_blank() {
        assert!(!Value::Boolean(false).is_blank());
        assert!(!Value::Integer(0).is_blank());
    }

    #[test]
    fn whitespace_is_not_blank() {
        assert!(!Value::String(" ".to_owned()).is_blank());
    }

    #[test]
    fn can_recognize_truthy_tokens() {
        for value in [
            Value::Boolean(true),
            Value::Integer(1),
            Value::from("1"),
            Value::from("t"),
            Value::from("T"),
            Value::from("true"),
            Value::from("TRUE"),
        ] {
            assert_eq!(Some(true), value.as_boolean());
        }
    }

    #[test]
    fn can_recognize_falsy_tokens() {
        for value in [
            Value::Boolean(false),
            Value::Integer(0),
            Value::from("0"),
            Value::from("f"),
            Value::from("F"),
            Value::from("false"),
            Value::from("FALSE"),
        ] {
            assert_eq!(Some(false), value.as_boolean());
        }
    }

    #[test]
    fn return_none_on_unrecognized_boolean_tokens() {
        assert_eq!(None, Value::from("yes").as_boolean());
        assert_eq!(None, Value::Integer(2).as_boolean());
        assert_eq!(None, Value::Null.as_boolean());
    }

    #[test]
    fn can_convert_scalars_from_json() {
        assert_eq!(Value::Null, Value::from_json(&serde_json::json!(null)));
        assert_eq!(
            Value::Boolean(true),
            Value::from_json(&serde_json::json!(true))
        );
        assert_eq!(Value::Integer(42), Value::from_json(&serde_json::json!(42)));
        assert_eq!(
            Value::from("active"),
            Value::from_json(&serde_json::json!("active"))
        );
    }

    #[test]
    fn can_convert_a_fractional_number_from_json() {
        assert_eq!(
            Value::Decimal(Decimal::new(15, 1)),
            Value::from_json(&serde_json::json!(1.5))
        );
    }

    #[test]
    fn inner_arrays_become_tuples() {
        let value = Value::from_json(&serde_json::json!([[1, 2], [3, 4]]));

        assert_eq!(
            Value::Array(vec![
                Value::Tuple(vec![Value::Integer(1), Value::Integer(2)]),
                Value::Tuple(vec![Value::Integer(3), Value::Integer(4)]),
            ]),
            value
        );
    }

    #[test]
    fn integers_and_decimals_compare_across_kinds() {
        assert!(Value::Integer(2).equals(&Value::Decimal(Decimal::new(20, 1))));
        assert_eq!(
            Some(Ordering::Less),
            Value::Integer(1).compare(&Value::Decimal(Decimal::new(15, 1)))
        );
    }

    #[test]
    fn mixed_kinds_do_not_compare() {
        assert_eq!(None, Value::from("1").compare(&Value::Integer(1)));
        assert!(!Value::from("1").equals(&Value::Integer(1)));
    }
}
