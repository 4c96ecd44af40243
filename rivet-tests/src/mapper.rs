use crate::{Car, Manufacturer};
use rivet::{Connection, ErrorKind, Value, conditions, data};

pub fn mapper(connection: &Connection) {
    let manufacturers = connection
        .mapper::<Manufacturer>()
        .expect("Could not get the Manufacturer mapper");

    // Entity
    let tesla = manufacturers
        .entity(data! { "name" => "Tesla", "founding_year" => 2003 })
        .expect("Could not build the entity");
    assert!(tesla.is_new());
    assert!(!tesla.is_dirty());
    assert!(tesla.value("id").unwrap().is_null());
    assert_eq!(tesla.value("founding_year").unwrap(), Value::Int64(Some(2003)));

    // Insert
    manufacturers.insert(&tesla).expect("Could not insert Tesla");
    assert!(!tesla.is_new());
    assert!(!tesla.is_dirty());
    assert_eq!(tesla.get::<i64>("id").unwrap(), 5);

    // Update
    tesla.set("stock_price", 250.5).unwrap();
    assert!(tesla.is_dirty());
    manufacturers.save(&tesla).expect("Could not update Tesla");
    assert!(!tesla.is_dirty());
    let rows = connection
        .select("manufacturer", conditions! { "id" => 5 })
        .unwrap()
        .rows()
        .expect("Could not read the manufacturer row");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get_column("stock_price"),
        Some(&Value::Float64(Some(250.5)))
    );
    assert_eq!(rows[0].get_column("name"), Some(&Value::from("Tesla")));

    // Validation
    let nameless = manufacturers.entity(data! {}).unwrap();
    let error = manufacturers
        .insert(&nameless)
        .expect_err("A manufacturer without name must not be inserted");
    assert!(matches!(
        ErrorKind::of(&error),
        Some(ErrorKind::Validation { field, .. }) if field == "Name"
    ));
    assert!(nameless.is_new());

    // Accessors
    tesla
        .call("setName", &["Tesla Motors".into()])
        .expect("Could not call setName");
    assert_eq!(
        tesla.call("getName", &[]).unwrap().into_value(),
        Some(Value::from("Tesla Motors"))
    );
    assert_eq!(
        tesla.call("isStockPrice", &[]).unwrap().into_value(),
        Some(Value::Boolean(Some(true)))
    );
    let error = tesla.call("getCeo", &[]).expect_err("getCeo is not an accessor");
    assert!(matches!(
        ErrorKind::of(&error),
        Some(ErrorKind::MethodNotFound { method, .. }) if method == "getCeo"
    ));
    manufacturers.save(&tesla).unwrap();
    let rows = connection
        .select("manufacturer", conditions! { "name" => "Tesla Motors" })
        .unwrap()
        .rows()
        .unwrap();
    assert_eq!(rows.len(), 1);

    // Create, the car mapper trims the name
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    let car = cars
        .create(data! {
            "name" => "  Model S ",
            "manufacturer_id" => tesla.value("id").unwrap(),
        })
        .expect("Could not create the car");
    assert_eq!(car.get::<String>("name").unwrap(), "Model S");
    assert_eq!(car.get::<i64>("id").unwrap(), 13);
    assert_eq!(
        cars.find(conditions! { "manufacturer_id" => 5 })
            .unwrap()
            .count(true)
            .unwrap(),
        1
    );
}

pub fn delete(connection: &Connection) {
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    let beetle = cars
        .first(conditions! { "name" => "Beetle" })
        .expect("Could not query the Beetle")
        .expect("The Beetle is missing");
    assert_eq!(beetle.get::<i64>("id").unwrap(), 10);
    assert!(!beetle.is_new());

    cars.delete(&beetle).expect("Could not delete the Beetle");
    assert!(beetle.is_new());
    assert!(beetle.value("id").unwrap().is_null());
    assert_eq!(beetle.get::<String>("name").unwrap(), "Beetle");
    assert!(cars.first(conditions! { "id" => 10 }).unwrap().is_none());
    assert_eq!(cars.find(conditions! {}).unwrap().count(true).unwrap(), 11);

    // Saved again as a new row
    cars.save(&beetle).expect("Could not insert the Beetle again");
    assert!(!beetle.is_new());
    assert_eq!(beetle.get::<i64>("id").unwrap(), 13);
    let found = cars.first(conditions! { "id" => 13 }).unwrap().unwrap();
    assert!(found.same(&beetle));

    // A deleted entity has no identifier left
    let golf = cars.first(conditions! { "id" => 11 }).unwrap().unwrap();
    cars.delete(&golf).unwrap();
    let error = cars.delete(&golf).expect_err("The Golf GTI is already deleted");
    assert!(matches!(
        ErrorKind::of(&error),
        Some(ErrorKind::InvalidArgument(..))
    ));
}
