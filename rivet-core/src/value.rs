use rust_decimal::Decimal;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value moved between entities, statements and rows.
///
/// Every variant carries an `Option` so that a typed NULL can still tell which
/// column type it belongs to. All the NULL flavours compare equal.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_null() || other.is_null() {
            return self.is_null() && other.is_null();
        }
        if let (Some(l), Some(r)) = (self.as_integer(), other.as_integer()) {
            return l == r;
        }
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l), Self::List(r)) => l == r,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::Float64(None)
                | Value::Decimal(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::Uuid(None)
                | Value::List(None)
        )
    }

    /// Integer payload widened to `i128`, for the integer variants only.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Int32(Some(v)) => Some(*v as i128),
            Value::Int64(Some(v)) => Some(*v as i128),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// Non-empty string, non-zero number, `true`, non-empty list or any other
    /// non-null value.
    pub fn is_truthy(&self) -> bool {
        match self {
            v if v.is_null() => false,
            Value::Boolean(Some(v)) => *v,
            Value::Int32(Some(v)) => *v != 0,
            Value::Int64(Some(v)) => *v != 0,
            Value::Float64(Some(v)) => *v != 0.0,
            Value::Decimal(Some(v)) => !v.is_zero(),
            Value::Varchar(Some(v)) => !v.is_empty() && v != "0",
            Value::Blob(Some(v)) => !v.is_empty(),
            Value::List(Some(v)) => !v.is_empty(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn nulls_are_equal() {
        assert_eq!(Value::Null, Value::Int64(None));
        assert_eq!(Value::Varchar(None), Value::Uuid(None));
        assert_ne!(Value::Null, Value::Int64(Some(0)));
    }

    #[test]
    fn integers_compare_across_widths() {
        assert_eq!(Value::Int32(Some(1975)), Value::Int64(Some(1975)));
        assert_ne!(Value::Int32(Some(1)), Value::Float64(Some(1.0)));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int64(Some(0)).is_truthy());
        assert!(Value::Varchar(Some("BMW".into())).is_truthy());
        assert!(!Value::List(Some(vec![])).is_truthy());
    }
}
