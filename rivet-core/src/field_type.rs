use crate::{AsValue, ErrorContext, Result, Value, error::invalid_argument};
use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Type tag of a mapped field, selecting the codec applied when values move
/// between the entity and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    SmallInt,
    BigInt,
    Float,
    Decimal,
    String,
    Text,
    Boolean,
    Date,
    Time,
    DateTime,
    Guid,
    Blob,
}

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::Integer,
        FieldType::SmallInt,
        FieldType::BigInt,
        FieldType::Float,
        FieldType::Decimal,
        FieldType::String,
        FieldType::Text,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Time,
        FieldType::DateTime,
        FieldType::Guid,
        FieldType::Blob,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::SmallInt => "smallint",
            FieldType::BigInt => "bigint",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::DateTime => "datetime",
            FieldType::Guid => "guid",
            FieldType::Blob => "blob",
        }
    }

    /// Case insensitive lookup of a type tag.
    pub fn from_tag(tag: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.tag().eq_ignore_ascii_case(tag))
            .ok_or_else(|| invalid_argument(format!("Unknown field type `{tag}`")))
    }

    /// The typed NULL of this field.
    pub fn empty_value(&self) -> Value {
        match self {
            FieldType::Integer | FieldType::SmallInt | FieldType::BigInt => i64::as_empty_value(),
            FieldType::Float => f64::as_empty_value(),
            FieldType::Decimal => Decimal::as_empty_value(),
            FieldType::String | FieldType::Text => String::as_empty_value(),
            FieldType::Boolean => bool::as_empty_value(),
            FieldType::Date => Date::as_empty_value(),
            FieldType::Time => Time::as_empty_value(),
            FieldType::DateTime => PrimitiveDateTime::as_empty_value(),
            FieldType::Guid => Uuid::as_empty_value(),
            FieldType::Blob => <Box<[u8]>>::as_empty_value(),
        }
    }

    /// Decode a value read from the database into the entity representation.
    pub fn to_native(&self, value: Value) -> Result<Value> {
        self.coerce(value)
    }

    /// Encode an entity value into the representation sent to the database.
    ///
    /// Values stay typed, the backend binds them with its own platform conversions.
    pub fn to_storage(&self, value: Value) -> Result<Value> {
        match value {
            Value::List(Some(values)) => Ok(Value::List(Some(
                values
                    .into_iter()
                    .map(|v| self.coerce(v))
                    .collect::<Result<_>>()?,
            ))),
            v => self.coerce(v),
        }
    }

    fn coerce(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(self.empty_value());
        }
        let description = format!("{value:?}");
        let result = match self {
            FieldType::Integer | FieldType::SmallInt | FieldType::BigInt => {
                i64::try_from_value(value).map(AsValue::as_value)
            }
            FieldType::Float => f64::try_from_value(value).map(AsValue::as_value),
            FieldType::Decimal => Decimal::try_from_value(value).map(AsValue::as_value),
            FieldType::String | FieldType::Text => {
                String::try_from_value(value).map(AsValue::as_value)
            }
            FieldType::Boolean => bool::try_from_value(value).map(AsValue::as_value),
            FieldType::Date => Date::try_from_value(value).map(AsValue::as_value),
            FieldType::Time => Time::try_from_value(value).map(AsValue::as_value),
            FieldType::DateTime => PrimitiveDateTime::try_from_value(value).map(AsValue::as_value),
            FieldType::Guid => Uuid::try_from_value(value).map(AsValue::as_value),
            FieldType::Blob => <Box<[u8]>>::try_from_value(value).map(AsValue::as_value),
        };
        result.with_context(|| format!("Cannot convert {description} to a {self} field"))
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
