mod resource {
    pub mod garage;
    pub mod recorder;
}

#[cfg(test)]
mod tests {
    use crate::resource::{
        garage::{Car, Manufacturer},
        recorder::Recorder,
    };
    use rivet::{Connection, ErrorKind, Flags, Output, Related, Value, data};
    use rust_decimal::Decimal;

    #[test]
    fn flags() {
        let flags = Flags::NEW | Flags::DIRTY;
        assert!(flags.contains(Flags::NEW));
        assert!(flags.contains(Flags::DIRTY));
        assert_eq!(flags & !Flags::NEW, Flags::DIRTY);
        assert_eq!(Flags::NONE.bits(), 0);
        assert!(Flags::NONE.contains(Flags::NONE));
        assert!(!Flags::DIRTY.contains(Flags::NEW));
    }

    #[test]
    fn values_and_lifecycle() {
        let connection = Connection::new(Recorder::new());
        let manufacturers = connection.mapper::<Manufacturer>().unwrap();
        let entity = manufacturers
            .entity(data! { "name" => "Audi", "headquarters" => "Ingolstadt" })
            .unwrap();
        assert_eq!(entity.flags(), Flags::NEW);
        assert_eq!(
            entity.data().keys().collect::<Vec<_>>(),
            ["id", "name", "stock_price", "founding_year"]
        );
        assert_eq!(entity.get::<i64>("founding_year").unwrap(), 1900);
        assert_eq!(entity.get::<Option<i64>>("id").unwrap(), None);

        // Writes go through the field codec
        entity.set("founding_year", "1909").unwrap();
        assert_eq!(entity.value("founding_year").unwrap(), Value::Int64(Some(1909)));
        entity.set("stock_price", 60700.5).unwrap();
        assert_eq!(
            entity.value("stock_price").unwrap(),
            Value::Decimal(Some(Decimal::new(607005, 1)))
        );
        assert!(entity.is_dirty());
        assert!(entity.set("founding_year", "next year").is_err());
        assert_eq!(entity.get::<i64>("founding_year").unwrap(), 1909);

        let error = entity.set("headquarters", "Ingolstadt").unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::InvalidArgument(..))
        ));
        let error = entity.value("cars").unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::InvalidArgument(..))
        ));

        entity.unflag(Flags::NEW | Flags::DIRTY);
        assert_eq!(entity.flags(), Flags::NONE);
        entity.flag(Flags::DIRTY);
        assert!(entity.flagged(Flags::DIRTY));
        assert!(!entity.is_new());

        let clone = entity.clone();
        assert!(clone.same(&entity));
        let other = manufacturers.entity(data! { "name" => "Audi" }).unwrap();
        assert!(!other.same(&entity));
    }

    #[test]
    fn dynamic_accessors() {
        let connection = Connection::new(Recorder::new());
        let cars = connection.mapper::<Car>().unwrap();
        let car = cars.entity(data! { "name" => "S4" }).unwrap();

        assert!(car.call("setName", &["RS4".into()]).unwrap().into_value().is_none());
        assert_eq!(
            car.call("getName", &[]).unwrap().into_value(),
            Some(Value::from("RS4"))
        );
        assert_eq!(
            car.call("isName", &[]).unwrap().into_value(),
            Some(Value::Boolean(Some(true)))
        );
        assert_eq!(
            car.call("isManufacturerId", &[]).unwrap().into_value(),
            Some(Value::Boolean(Some(false)))
        );
        car.call("setManufacturerId", &[Value::Int32(Some(1))])
            .unwrap();
        assert_eq!(car.get::<i64>("manufacturer_id").unwrap(), 1);

        let error = car.call("setName", &[]).unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::InvalidArgument(..))
        ));
        let error = car.call("setManufacturer", &["Audi".into()]).unwrap_err();
        assert_eq!(
            ErrorKind::of(&error),
            Some(&ErrorKind::MethodNotFound {
                owner: "Car".into(),
                method: "setManufacturer".into(),
            })
        );
        assert!(car.call("fly", &[]).is_err());

        // Relations are only readable
        let manufacturers = connection.mapper::<Manufacturer>().unwrap();
        let audi = manufacturers.entity(data! { "name" => "Audi" }).unwrap();
        car.set_related("manufacturer", Related::One(Some(audi.clone())))
            .unwrap();
        let Output::Related(Related::One(Some(related))) =
            car.call("getManufacturer", &[]).unwrap()
        else {
            panic!("getManufacturer must return the assigned entity");
        };
        assert!(related.same(&audi));
        assert_eq!(
            car.call("isManufacturer", &[]).unwrap().into_value(),
            Some(Value::Boolean(Some(true)))
        );
        assert!(!car.data().contains_key("manufacturer"));
    }
}
