//! Typed interpretation of a server's dynamic attribute bag.
//!
//! The bag itself is free-form JSON. A [`FieldRule`] built from a catalog
//! entry says how one key should be read; [`validate_attributes`] checks a
//! whole bag against the catalog and reports every violation at once.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared type of a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Enum,
    Date,
    Url,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Date => "date",
            Self::Url => "url",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "enum" => Ok(Self::Enum),
            "date" => Ok(Self::Date),
            "url" => Ok(Self::Url),
            other => Err(format!(
                "Unknown field type: {other}. Expected one of: string, number, boolean, enum, date, url"
            )),
        }
    }
}

/// An attribute value read through its catalog type.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Choice(String),
    Date(NaiveDate),
    Url(url::Url),
}

impl AttributeValue {
    /// Interpret `raw` as a value of `field_type`.
    ///
    /// `options` is the catalog entry's options payload; for enums its
    /// `values` array lists the allowed choices. An enum without a `values`
    /// list accepts any string.
    pub fn interpret(field_type: FieldType, options: &Value, raw: &Value) -> Result<Self, String> {
        match field_type {
            FieldType::String => raw
                .as_str()
                .map(|s| Self::Text(s.to_string()))
                .ok_or_else(|| expected("a string", raw)),
            FieldType::Number => raw
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| expected("a number", raw)),
            FieldType::Boolean => raw
                .as_bool()
                .map(Self::Boolean)
                .ok_or_else(|| expected("a boolean", raw)),
            FieldType::Enum => {
                let choice = raw.as_str().ok_or_else(|| expected("a string choice", raw))?;
                match enum_values(options) {
                    Some(allowed) if !allowed.contains(&choice) => Err(format!(
                        "{choice:?} is not one of: {}",
                        allowed.join(", ")
                    )),
                    _ => Ok(Self::Choice(choice.to_string())),
                }
            }
            FieldType::Date => {
                let text = raw.as_str().ok_or_else(|| expected("a date string", raw))?;
                parse_date(text)
                    .map(Self::Date)
                    .ok_or_else(|| format!("{text:?} is not a YYYY-MM-DD or RFC 3339 date"))
            }
            FieldType::Url => {
                let text = raw.as_str().ok_or_else(|| expected("a URL string", raw))?;
                let parsed =
                    url::Url::parse(text).map_err(|e| format!("{text:?} is not a URL: {e}"))?;
                if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() {
                    Ok(Self::Url(parsed))
                } else {
                    Err(format!("{text:?} is not an http(s) URL"))
                }
            }
        }
    }
}

/// How one catalog key constrains the attribute bag.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub key: String,
    pub field_type: FieldType,
    pub options: Value,
    pub required: bool,
}

/// One reason an attribute bag does not match the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeViolation {
    pub key: String,
    pub reason: String,
}

impl std::fmt::Display for AttributeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// Check `attributes` against `rules`.
///
/// Keys without a rule pass through. `null` is accepted for any typed key.
/// When `check_required` is set, every required rule must have a non-null
/// value.
pub fn validate_attributes(
    rules: &[FieldRule],
    attributes: &Map<String, Value>,
    check_required: bool,
) -> Result<(), Vec<AttributeViolation>> {
    let mut violations = Vec::new();

    for rule in rules {
        match attributes.get(&rule.key) {
            None | Some(Value::Null) => {
                if check_required && rule.required {
                    violations.push(AttributeViolation {
                        key: rule.key.clone(),
                        reason: "required field is missing".to_string(),
                    });
                }
            }
            Some(raw) => {
                if let Err(reason) = AttributeValue::interpret(rule.field_type, &rule.options, raw)
                {
                    violations.push(AttributeViolation {
                        key: rule.key.clone(),
                        reason,
                    });
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn enum_values(options: &Value) -> Option<Vec<&str>> {
    options
        .get("values")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_str).collect())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn expected(what: &str, raw: &Value) -> String {
    format!("expected {what}, got {raw}")
}
