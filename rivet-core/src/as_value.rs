use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
use atoi::FromRadix10Signed;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::{any, str::FromStr};
use time::{Date, PrimitiveDateTime, Time, macros::format_description};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// # Parsing contract
/// - `parse` delegates to `extract` then verifies the input is exhausted.
/// - `extract` updates the input slice only on success.
///
/// # Examples
/// ```rust
/// use rivet_core::{AsValue, Value};
/// let v = 1975i64.as_value();
/// assert!(matches!(v, Value::Int64(Some(1975))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 1975);
/// ```
pub trait AsValue {
    /// The NULL flavour of the value this type produces.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        let mut value = input.as_ref();
        let result = Self::extract(&mut value)?;
        if !value.is_empty() {
            return Err(Error::msg(format!(
                "Value `{}` parsed correctly as {} but it did not consume all the input (remaining: `{}`)",
                truncate_long!(input.as_ref()),
                any::type_name::<Self>(),
                truncate_long!(value),
            )));
        }
        Ok(result)
    }
    fn extract(value: &mut &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse '{value}' as {}",
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

macro_rules! impl_as_integer {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $($pat_rest => $expr_rest,)*
                    Value::Boolean(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => {
                        let error = Error::msg(format!(
                            "Value {v}: Decimal does not fit into {}",
                            any::type_name::<Self>()
                        ));
                        if !v.is_integer() {
                            return Err(error.context("The value is not a integer"));
                        }
                        v.to_i64()
                            .and_then(|v| <$source>::try_from(v).ok())
                            .ok_or(error)
                    }
                    Value::Float64(Some(v)) if v.fract() == 0.0 => {
                        if v < <$source>::MIN as f64 || v > <$source>::MAX as f64 {
                            return Err(Error::msg(format!(
                                "Value {v}: f64 is out of range for {}",
                                any::type_name::<Self>(),
                            )));
                        }
                        Ok(v as _)
                    }
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
            fn extract(input: &mut &str) -> Result<Self> {
                let value = *input;
                let (num, len) = i128::from_radix_10_signed(value.as_bytes());
                if len == 0 {
                    return Err(Error::msg(format!(
                        "Cannot extract {} from `{}`",
                        any::type_name::<Self>(),
                        truncate_long!(value)
                    )));
                }
                let num = <$source>::try_from(num).map_err(|_| {
                    Error::msg(format!(
                        "Parsed integer {} is out of range for {}",
                        &value[..len],
                        any::type_name::<Self>(),
                    ))
                })?;
                *input = &value[len..];
                Ok(num)
            }
        }
    };
}
impl_as_integer!(
    i32,
    Value::Int32,
    Value::Int64(Some(v)) => i32::try_from(v)
        .map_err(|_| Error::msg(format!("Value {v}: i64 is out of range for i32"))),
);
impl_as_integer!(
    i64,
    Value::Int64,
    Value::Int32(Some(v)) => Ok(v as _),
);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to bool"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let mut value = *input;
        let word = crate::consume_while(&mut value, |v| v.is_alphanumeric() || *v == '_');
        let result = match word {
            x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x == "1" => true,
            x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x == "0" => {
                false
            }
            _ => return Err(Error::msg(format!("Cannot parse boolean from '{input}'"))),
        };
        *input = value;
        Ok(result)
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v as _),
            Value::Int64(Some(v)) => Ok(v as _),
            Value::Decimal(Some(v)) => v
                .to_f64()
                .ok_or_else(|| Error::msg(format!("Cannot convert the Decimal value `{v}` to f64"))),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to f64"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let value = *input;
        let (num, len) = fast_float::parse_partial::<f64, _>(value).with_context(|| {
            format!(
                "Cannot extract a floating point value from `{}`",
                truncate_long!(value)
            )
        })?;
        *input = &value[len..];
        Ok(num)
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(Decimal::new(v as i64, 0)),
            Value::Int64(Some(v)) => Ok(Decimal::new(v, 0)),
            Value::Float64(Some(v)) => Decimal::from_f64(v)
                .ok_or_else(|| Error::msg(format!("Cannot convert {value:?} to Decimal"))),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Decimal"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let value = *input;
        let len = value
            .char_indices()
            .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-'))
            .count();
        let result = Decimal::from_str(&value[..len]).with_context(|| {
            format!("Cannot extract a Decimal from `{}`", truncate_long!(value))
        })?;
        *input = &value[len..];
        Ok(result)
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(itoa::Buffer::new().format(v).to_owned()),
            Value::Int64(Some(v)) => Ok(itoa::Buffer::new().format(v).to_owned()),
            Value::Float64(Some(v)) => Ok(ryu::Buffer::new().format(v).to_owned()),
            Value::Decimal(Some(v)) => Ok(v.to_string()),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec())
                .context("The blob is not a valid UTF-8 string"),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to String"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let result = (*input).to_owned();
        *input = "";
        Ok(result)
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to a blob"))),
        }
    }
}

macro_rules! impl_as_temporal {
    ($source:ty, $destination:path, $($format:expr),+ $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
            fn extract(input: &mut &str) -> Result<Self> {
                let value = input.trim_matches(|c| c == '\'' || c == '"');
                $(
                    if let Ok(result) = <$source>::parse(value, $format) {
                        *input = "";
                        return Ok(result);
                    }
                )+
                Err(Error::msg(format!(
                    "Cannot parse `{}` as {}",
                    truncate_long!(*input),
                    any::type_name::<Self>()
                )))
            }
        }
    };
}
impl_as_temporal!(Date, Value::Date, format_description!("[year]-[month]-[day]"));
impl_as_temporal!(
    Time,
    Value::Time,
    format_description!("[hour]:[minute]:[second].[subsecond]"),
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
);
impl_as_temporal!(
    PrimitiveDateTime,
    Value::Timestamp,
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
);

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Self::parse(v),
            Value::Blob(Some(ref v)) => Uuid::from_slice(v).context("Cannot read a UUID from the blob"),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Uuid"))),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let value = input.trim_matches(|c| c == '\'' || c == '"');
        let result = Uuid::parse_str(value)
            .with_context(|| format!("Cannot parse `{}` as Uuid", truncate_long!(value)))?;
        *input = "";
        Ok(result)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(T::try_from_value(value)?))
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None)
    }
    fn as_value(self) -> Value {
        Value::List(Some(self.into_iter().map(AsValue::as_value).collect()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v)) => v.into_iter().map(T::try_from_value).collect(),
            Value::List(None) => Ok(Vec::new()),
            _ => Err(Error::msg(format!(
                "Cannot convert {value:?} to {}",
                any::type_name::<Self>(),
            ))),
        }
    }
}
