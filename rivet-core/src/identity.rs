use crate::Value;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum KeyValue {
    Integer(i128),
    Float(u64),
    Text(String),
    Bytes(Box<[u8]>),
}

impl KeyValue {
    fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            v if v.is_null() => return None,
            Value::Boolean(Some(v)) => KeyValue::Integer(*v as i128),
            Value::Int32(Some(v)) => KeyValue::Integer(*v as i128),
            Value::Int64(Some(v)) => KeyValue::Integer(*v as i128),
            Value::Float64(Some(v)) if v.is_finite() && v.fract() == 0.0 => {
                KeyValue::Integer(*v as i128)
            }
            Value::Float64(Some(v)) => KeyValue::Float(v.to_bits()),
            Value::Decimal(Some(v)) if v.is_integer() => {
                KeyValue::Integer(v.mantissa() / 10i128.pow(v.scale()))
            }
            Value::Decimal(Some(v)) => KeyValue::Text(v.normalize().to_string()),
            Value::Varchar(Some(v)) => KeyValue::Text(v.clone()),
            Value::Blob(Some(v)) => KeyValue::Bytes(v.clone()),
            Value::Date(Some(v)) => KeyValue::Text(v.to_string()),
            Value::Time(Some(v)) => KeyValue::Text(v.to_string()),
            Value::Timestamp(Some(v)) => KeyValue::Text(v.to_string()),
            Value::Uuid(Some(v)) => KeyValue::Text(v.to_string()),
            _ => return None,
        })
    }
}

/// Canonical identity of a persisted entity within one mapper.
///
/// Identifier values are ordered by field name and normalized structurally:
/// integers of any width (and integral floats or decimals) hash the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(Vec<(String, KeyValue)>);

impl IdentityKey {
    /// Build the key from identifier field values, `None` if any of them is null.
    pub fn new<'a>(values: impl IntoIterator<Item = (&'a str, &'a Value)>) -> Option<Self> {
        let mut key = values
            .into_iter()
            .map(|(name, value)| Some((name.to_owned(), KeyValue::from_value(value)?)))
            .collect::<Option<Vec<_>>>()?;
        if key.is_empty() {
            return None;
        }
        key.sort_by(|a, b| a.0.cmp(&b.0));
        Some(Self(key))
    }
}

impl Display for IdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                KeyValue::Integer(v) => write!(f, "{name}={v}")?,
                KeyValue::Float(v) => write!(f, "{name}={}", f64::from_bits(*v))?,
                KeyValue::Text(v) => write!(f, "{name}={v:?}")?,
                KeyValue::Bytes(v) => write!(f, "{name}=<{} bytes>", v.len())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityKey;
    use crate::Value;
    use rust_decimal::Decimal;

    #[test]
    fn order_and_width_do_not_matter() {
        let a = Value::Int32(Some(5));
        let b = Value::Int64(Some(1));
        let c = Value::Int64(Some(5));
        let d = Value::Decimal(Some(Decimal::new(10, 1)));
        assert_eq!(
            IdentityKey::new([("car_id", &a), ("driver_id", &b)]),
            IdentityKey::new([("driver_id", &d), ("car_id", &c)]),
        );
    }

    #[test]
    fn incomplete_keys_are_rejected() {
        let id = Value::Int64(None);
        assert_eq!(IdentityKey::new([("id", &id)]), None);
        assert_eq!(IdentityKey::new([]), None);
    }
}
