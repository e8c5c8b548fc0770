use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl ScriptValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Numbers pass through, booleans map to 0/1 and numeric strings are
    /// parsed; everything else has no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::String(value) => value.trim().parse::<f64>().ok(),
            Self::Null => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0,
            Self::String(value) => !value.is_empty(),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_reading_covers_strings_and_bools() {
        assert_eq!(ScriptValue::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(ScriptValue::from(true).as_number(), Some(1.0));
        assert_eq!(ScriptValue::from("abc").as_number(), None);
        assert_eq!(ScriptValue::Null.as_number(), None);
    }

    #[test]
    fn display_renders_integral_numbers_without_fraction() {
        assert_eq!(ScriptValue::from(3).to_string(), "3");
        assert_eq!(ScriptValue::from(2.5).to_string(), "2.5");
        assert_eq!(ScriptValue::Null.to_string(), "");
    }

    #[test]
    fn truthiness_follows_value_kind() {
        assert!(!ScriptValue::Null.is_truthy());
        assert!(!ScriptValue::from(0).is_truthy());
        assert!(ScriptValue::from("x").is_truthy());
        assert!(!ScriptValue::from("").is_truthy());
    }

    #[test]
    fn serde_uses_untagged_representation() {
        let values = vec![
            ScriptValue::Null,
            ScriptValue::from(true),
            ScriptValue::from(4),
            ScriptValue::from("hi"),
        ];
        let json = serde_json::to_string(&values).expect("values should serialize");
        assert_eq!(json, r#"[null,true,4.0,"hi"]"#);
        let back: Vec<ScriptValue> = serde_json::from_str(&json).expect("values should parse");
        assert_eq!(back, values);
    }
}
