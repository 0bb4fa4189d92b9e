use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Column names the skeleton migration manages itself.
pub const TIMESTAMP_FIELDS: [&str; 3] = ["created_at", "updated_at", "deleted_at"];

/// Storage kind of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Text,
    LongText,
    MediumText,
    Integer,
    BigInteger,
    TinyInteger,
    SmallInteger,
    Boolean,
    Date,
    Datetime,
    Timestamp,
    Decimal,
    Float,
    Double,
    Json,
    Jsonb,
}

impl FieldType {
    pub const ALL: [FieldType; 17] = [
        FieldType::String,
        FieldType::Text,
        FieldType::LongText,
        FieldType::MediumText,
        FieldType::Integer,
        FieldType::BigInteger,
        FieldType::TinyInteger,
        FieldType::SmallInteger,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Timestamp,
        FieldType::Decimal,
        FieldType::Float,
        FieldType::Double,
        FieldType::Json,
        FieldType::Jsonb,
    ];

    /// Wire name, as accepted in field schemas.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::LongText => "longText",
            FieldType::MediumText => "mediumText",
            FieldType::Integer => "integer",
            FieldType::BigInteger => "bigInteger",
            FieldType::TinyInteger => "tinyInteger",
            FieldType::SmallInteger => "smallInteger",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Timestamp => "timestamp",
            FieldType::Decimal => "decimal",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Json => "json",
            FieldType::Jsonb => "jsonb",
        }
    }

    /// Schema builder method used in migration column lines.
    pub fn migration_method(self) -> &'static str {
        match self {
            FieldType::Datetime => "dateTime",
            other => other.as_str(),
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            FieldType::Integer
                | FieldType::BigInteger
                | FieldType::TinyInteger
                | FieldType::SmallInteger
        )
    }

    pub fn is_decimal(self) -> bool {
        matches!(self, FieldType::Decimal | FieldType::Float | FieldType::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    pub fn is_json(self) -> bool {
        matches!(self, FieldType::Json | FieldType::Jsonb)
    }

    /// Unbounded text columns (text, mediumText, longText).
    pub fn is_long_text(self) -> bool {
        matches!(
            self,
            FieldType::Text | FieldType::MediumText | FieldType::LongText
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            FieldType::Date | FieldType::Datetime | FieldType::Timestamp
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default literal attached to a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl DefaultValue {
    /// Empty strings are treated as "no default".
    pub fn is_empty(&self) -> bool {
        matches!(self, DefaultValue::Text(text) if text.is_empty())
    }

    /// Truthiness used when the column is boolean.
    pub fn truthy(&self) -> bool {
        match self {
            DefaultValue::Bool(value) => *value,
            DefaultValue::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
            DefaultValue::Text(text) => {
                !matches!(text.trim().to_ascii_lowercase().as_str(), "" | "0" | "false")
            }
        }
    }

    /// Render as a PHP literal for a column of `field_type`.
    ///
    /// Boolean columns render `true`/`false`, numeric-looking values render
    /// bare, everything else is single-quoted.
    pub fn php_literal(&self, field_type: FieldType) -> String {
        if field_type == FieldType::Boolean {
            return if self.truthy() { "true" } else { "false" }.to_string();
        }
        match self {
            DefaultValue::Bool(value) => value.to_string(),
            DefaultValue::Number(number) => number.to_string(),
            DefaultValue::Text(text) if is_php_numeric(text.trim()) => text.trim().to_string(),
            DefaultValue::Text(text) => php_quote(text),
        }
    }
}

/// Decimal literal with optional sign, fraction and exponent: `-3`, `9.99`, `1e5`.
fn is_php_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(index) => (&unsigned[..index], Some(&unsigned[index + 1..])),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
        return false;
    }
    match exponent {
        None => true,
        Some(exponent) => {
            let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            !exponent.is_empty() && digits(exponent)
        }
    }
}

/// Single-quote a string for PHP source.
pub fn php_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// One column of the entity being generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_default",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<DefaultValue>")]
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value).filter(|value| !value.is_empty());
        self
    }

    /// True for `created_at`, `updated_at`, `deleted_at`.
    pub fn is_timestamp_column(&self) -> bool {
        TIMESTAMP_FIELDS.contains(&self.name.as_str())
    }
}

fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DefaultValue>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.is_empty()))
}
