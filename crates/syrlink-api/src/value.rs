// Status value coercion.
//
// Raw `<c n v/>` readings are strings on the wire. A small key
// vocabulary pins certain keys to booleans or text; everything else is
// coerced numerically with text as the fallback, so an unexpected
// firmware string never fails a poll.

use std::fmt;

use serde::Serialize;

/// Keys whose `"0"`/`"1"` payloads are protocol booleans.
const BINARY_KEYS: &[&str] = &[
    "getSRE", "getPA1", "getPA2", "getPA3", "getPA4", "getPA5", "getPA6", "getPA7", "getPA8",
];

/// Keys that stay text even when they look numeric. Serial numbers,
/// firmware versions, and addresses lose information under numeric
/// coercion ("2.90" is not 2.9).
const STRING_KEYS: &[&str] = &[
    "getCNA", "getDGW", "getDTT", "getFIR", "getIPA", "getMAC", "getMAN", "getRTI", "getRPW",
    "getSRN", "getVER", "getWFC", "getWHU",
];

/// A coerced device reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl StatusValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view over both integer and float readings.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Coerce a raw reading according to the key vocabulary.
///
/// Binary keys map `"1"`/`"0"` to booleans and keep anything else as
/// text. String keys are passed through untouched. All other keys try
/// integer, then float, then fall back to text.
pub fn coerce(key: &str, raw: &str) -> StatusValue {
    if BINARY_KEYS.contains(&key) {
        return match raw.trim() {
            "1" => StatusValue::Bool(true),
            "0" => StatusValue::Bool(false),
            _ => StatusValue::Text(raw.to_owned()),
        };
    }
    if STRING_KEYS.contains(&key) {
        return StatusValue::Text(raw.to_owned());
    }

    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return StatusValue::Int(n);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return StatusValue::Float(v);
    }
    StatusValue::Text(raw.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn binary_keys_become_booleans() {
        assert_eq!(coerce("getSRE", "1"), StatusValue::Bool(true));
        assert_eq!(coerce("getSRE", "0"), StatusValue::Bool(false));
        assert_eq!(coerce("getPA3", "1"), StatusValue::Bool(true));
    }

    #[test]
    fn binary_keys_keep_unexpected_payloads_as_text() {
        assert_eq!(coerce("getSRE", "2"), StatusValue::Text("2".into()));
        assert_eq!(coerce("getPA1", ""), StatusValue::Text(String::new()));
    }

    #[test]
    fn string_keys_never_go_numeric() {
        assert_eq!(coerce("getSRN", "210836887"), StatusValue::Text("210836887".into()));
        assert_eq!(coerce("getVER", "2.9"), StatusValue::Text("2.9".into()));
        assert_eq!(coerce("getFIR", "SLPL"), StatusValue::Text("SLPL".into()));
    }

    #[test]
    fn unknown_keys_coerce_int_then_float_then_text() {
        assert_eq!(coerce("getPRS", "39"), StatusValue::Int(39));
        assert_eq!(coerce("getFLO", "0"), StatusValue::Int(0));
        assert_eq!(coerce("getCS1", "41.5"), StatusValue::Float(41.5));
        assert_eq!(coerce("getSTA", "regenerating"), StatusValue::Text("regenerating".into()));
    }

    #[test]
    fn whitespace_is_tolerated_around_numbers() {
        assert_eq!(coerce("getTOR", " 722 "), StatusValue::Int(722));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(StatusValue::Int(39).as_f64(), Some(39.0));
        assert_eq!(StatusValue::Float(3.9).as_f64(), Some(3.9));
        assert_eq!(StatusValue::Bool(true).as_f64(), None);
        assert_eq!(StatusValue::Text("x".into()).as_str(), Some("x"));
    }
}
