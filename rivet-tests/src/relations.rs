use crate::{Car, DataSheet, Driver, Manufacturer};
use rivet::{Connection, Output, Related, Value, conditions, data};

pub fn relations(connection: &Connection) {
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    let manufacturers = connection
        .mapper::<Manufacturer>()
        .expect("Could not get the Manufacturer mapper");

    // One
    let a3 = cars.first(conditions! { "id" => 1 }).unwrap().unwrap();
    let audi = a3
        .related("manufacturer")
        .expect("Could not resolve the manufacturer")
        .one()
        .expect("The A3 has a manufacturer");
    assert_eq!(audi.get::<String>("name").unwrap(), "Audi");
    let tracked = manufacturers
        .first(conditions! { "id" => 1 })
        .unwrap()
        .unwrap();
    assert!(tracked.same(&audi));
    assert_eq!(
        a3.call("isManufacturer", &[]).unwrap().into_value(),
        Some(Value::Boolean(Some(true)))
    );

    // Many
    let audi_cars = audi.related("cars").unwrap().many().expect("cars is a many relation");
    assert_eq!(audi_cars.count(false).unwrap(), 3);
    assert!(audi_cars.run().unwrap()[0].same(&a3));
    let Output::Related(Related::Many(query)) = audi.call("getCars", &[]).unwrap() else {
        panic!("getCars must return a query");
    };
    assert_eq!(query.count(true).unwrap(), 3);
    assert_eq!(
        audi.call("isCars", &[]).unwrap().into_value(),
        Some(Value::Boolean(Some(true)))
    );
    let tesla = manufacturers
        .create(data! { "name" => "Tesla" })
        .expect("Could not create Tesla");
    assert_eq!(
        tesla.call("isCars", &[]).unwrap().into_value(),
        Some(Value::Boolean(Some(false)))
    );

    // Optional
    let sheet = a3
        .related("data_sheet")
        .unwrap()
        .one()
        .expect("The A3 has a data sheet");
    assert_eq!(sheet.get::<i64>("horsepower").unwrap(), 220);
    let back = sheet.related("car").unwrap().one().unwrap();
    assert!(back.same(&a3));
    let s4 = cars.first(conditions! { "id" => 2 }).unwrap().unwrap();
    assert!(s4.related("data_sheet").unwrap().one().is_none());

    // Relations follow the current field values
    s4.set("manufacturer_id", 4).unwrap();
    let volkswagen = s4.related("manufacturer").unwrap().one().unwrap();
    assert_eq!(volkswagen.get::<String>("name").unwrap(), "Volkswagen");
    let orphan = cars
        .entity(data! { "name" => "Prototype", "manufacturer_id" => 99 })
        .unwrap();
    assert!(orphan.related("manufacturer").unwrap().one().is_none());
    assert_eq!(
        orphan.call("isManufacturer", &[]).unwrap().into_value(),
        Some(Value::Boolean(Some(false)))
    );

    // Explicit assignment
    let sheets = connection.mapper::<DataSheet>().unwrap();
    let empty = sheets.entity(data! { "car_id" => 2 }).unwrap();
    assert_eq!(empty.get::<i64>("horsepower").unwrap(), 0);
    orphan
        .set_related("manufacturer", Related::One(Some(audi.clone())))
        .unwrap();
    assert!(orphan.is_dirty());
    assert!(
        orphan
            .related("manufacturer")
            .unwrap()
            .one()
            .unwrap()
            .same(&audi)
    );
    assert!(orphan.set_related("owner", Related::One(None)).is_err());
    assert!(orphan.related("owner").is_err());
}

pub fn through(connection: &Connection) {
    let drivers = connection
        .mapper::<Driver>()
        .expect("Could not get the Driver mapper");
    let cars = connection.mapper::<Car>().unwrap();

    let marco = drivers
        .first(conditions! { "name" => "Marco" })
        .unwrap()
        .expect("Marco is a driver");
    let driven = marco.related("cars").unwrap().many().unwrap();
    let names = driven
        .iter()
        .unwrap()
        .map(|v| v.get::<String>("name").unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, ["M4 Coupé", "AMG GT"]);

    let jesus = drivers
        .first(conditions! { "name" => "Jesus" })
        .unwrap()
        .unwrap();
    assert_eq!(
        jesus.related("cars").unwrap().many().unwrap().count(true).unwrap(),
        0
    );

    // Named target
    let m4 = cars.first(conditions! { "id" => 5 }).unwrap().unwrap();
    let m4_drivers = m4.related("drivers").unwrap().many().unwrap().run().unwrap();
    assert_eq!(m4_drivers.len(), 1);
    assert!(m4_drivers[0].same(&marco));

    // New links are visible on the next read
    connection
        .execute("INSERT INTO car_driver (car_id, driver_id) VALUES (1, 2), (1, 1)")
        .expect("Could not link the drivers");
    let a3_drivers = cars
        .first(conditions! { "id" => 1 })
        .unwrap()
        .unwrap()
        .related("drivers")
        .unwrap()
        .many()
        .unwrap();
    assert_eq!(a3_drivers.count(true).unwrap(), 2);
    assert_eq!(
        jesus.related("cars").unwrap().many().unwrap().count(true).unwrap(),
        1
    );
}
