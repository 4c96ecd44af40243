#[cfg(test)]
mod tests {
    use rivet::{AsValue, FieldType, IdentityKey, Value};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::macros::{date, datetime, time};
    use uuid::Uuid;

    #[test]
    fn native_conversions() {
        assert_eq!(i64::try_from_value(Value::Varchar(Some("-42".into()))).unwrap(), -42);
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert!(i32::try_from_value(Value::Int64(Some(i64::MAX))).is_err());
        assert!(bool::try_from_value(Value::from("t")).unwrap());
        assert!(!bool::try_from_value(Value::Int64(Some(0))).unwrap());
        assert_eq!(f64::try_from_value(Value::from("2.5")).unwrap(), 2.5);
        assert_eq!(
            Decimal::try_from_value(Value::from("6897.25")).unwrap(),
            Decimal::from_str("6897.25").unwrap()
        );
        assert_eq!(
            String::try_from_value(Value::Float64(Some(1.5))).unwrap(),
            "1.5"
        );
        assert_eq!(
            Option::<i64>::try_from_value(Value::Varchar(None)).unwrap(),
            None
        );
        assert_eq!(
            Vec::<i64>::try_from_value(Value::List(Some(vec![1.into(), "2".into()]))).unwrap(),
            [1, 2]
        );
        assert!(i64::parse("12 cars").is_err());
        assert_eq!(Some(3i32).as_value(), Value::Int32(Some(3)));
        assert!(Option::<Uuid>::None.as_value().is_null());
    }

    #[test]
    fn temporal_conversions() {
        assert_eq!(
            time::Date::try_from_value(Value::from("1909-07-16")).unwrap(),
            date!(1909 - 07 - 16)
        );
        assert_eq!(
            time::Time::try_from_value(Value::from("10:30:15.250")).unwrap(),
            time!(10:30:15.250)
        );
        assert_eq!(
            time::PrimitiveDateTime::try_from_value(Value::from("2025-06-01T10:30:00")).unwrap(),
            datetime!(2025-06-01 10:30:00)
        );
        assert!(time::Date::try_from_value(Value::from("16/07/1909")).is_err());
    }

    #[test]
    fn field_codecs() {
        assert_eq!(FieldType::Integer.empty_value(), Value::Int64(None));
        assert!(matches!(FieldType::Text.empty_value(), Value::Varchar(None)));
        assert!(matches!(
            FieldType::Integer.to_native(Value::Null).unwrap(),
            Value::Int64(None)
        ));
        assert!(matches!(
            FieldType::Integer.to_native(Value::Int32(Some(4))).unwrap(),
            Value::Int64(Some(4))
        ));
        assert!(matches!(
            FieldType::Boolean.to_native(Value::Int64(Some(1))).unwrap(),
            Value::Boolean(Some(true))
        ));
        let holder = "8a3c7f22-4c71-4f5d-9a53-6a4c2b2f0c11";
        assert_eq!(
            FieldType::Guid.to_native(Value::from(holder)).unwrap(),
            Value::Uuid(Some(Uuid::parse_str(holder).unwrap()))
        );
        assert_eq!(
            FieldType::Integer
                .to_storage(Value::List(Some(vec!["1".into(), 2.into()])))
                .unwrap(),
            Value::List(Some(vec![Value::Int64(Some(1)), Value::Int64(Some(2))]))
        );
        let error = FieldType::Date.to_native(Value::from("yesterday")).unwrap_err();
        assert!(format!("{error:#}").contains("date field"));
        assert_eq!(FieldType::SmallInt.to_string(), "smallint");
    }

    #[test]
    fn identity_keys() {
        let narrow = Value::Int32(Some(3));
        let wide = Value::Int64(Some(3));
        assert_eq!(
            IdentityKey::new([("id", &narrow)]),
            IdentityKey::new([("id", &wide)])
        );
        let driver = Value::Int64(Some(1));
        assert_eq!(
            IdentityKey::new([("number", &narrow), ("driver_id", &driver)]),
            IdentityKey::new([("driver_id", &driver), ("number", &wide)])
        );
        assert!(IdentityKey::new([("id", &Value::Null)]).is_none());
        assert!(IdentityKey::new(Vec::<(&str, &Value)>::new()).is_none());
        let key = IdentityKey::new([("driver_id", &driver), ("number", &narrow)]).unwrap();
        assert_eq!(key.to_string(), "driver_id=1, number=3");
    }
}
