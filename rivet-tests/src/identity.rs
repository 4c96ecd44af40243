use crate::{Car, Manufacturer};
use rivet::{Connection, conditions, data};

pub fn identity(connection: &Connection) {
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    assert_eq!(cars.tracked(), 0);

    let first = cars.first(conditions! { "id" => 3 }).unwrap().unwrap();
    let second = cars.first(conditions! { "id" => 3 }).unwrap().unwrap();
    assert!(first.same(&second));
    assert_eq!(cars.tracked(), 1);

    let audi_cars = cars
        .find(conditions! { "manufacturer_id" => 1 })
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(audi_cars.len(), 3);
    assert!(audi_cars[2].same(&first));
    assert_eq!(cars.tracked(), 3);

    // Changes are shared by every handle
    first.set("name", "A8 L").unwrap();
    assert_eq!(second.get::<String>("name").unwrap(), "A8 L");
    assert!(audi_cars[2].is_dirty());

    // Tracked entities are not refreshed by later reads
    connection
        .execute("UPDATE car SET name = 'Changed' WHERE id = 3")
        .unwrap();
    let reloaded = cars
        .find(conditions! { "name" => "Changed" })
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded[0].same(&first));
    assert_eq!(reloaded[0].get::<String>("name").unwrap(), "A8 L");

    // Exact identifier lookups are served without a query
    connection.execute("DELETE FROM car WHERE id = 3").unwrap();
    let cached = cars.first(conditions! { "id" => 3 }).unwrap();
    assert!(cached.is_some_and(|v| v.same(&first)));
    assert!(
        cars.find(conditions! { "id" => 3 })
            .unwrap()
            .run()
            .unwrap()
            .is_empty()
    );

    // Inserted entities are tracked
    let manufacturers = connection.mapper::<Manufacturer>().unwrap();
    let tesla = manufacturers.create(data! { "name" => "Tesla" }).unwrap();
    let found = manufacturers
        .first(conditions! { "id" => 5 })
        .unwrap()
        .unwrap();
    assert!(found.same(&tesla));

    // Every mapper has its own identity map
    assert_eq!(manufacturers.tracked(), 1);
    assert_eq!(cars.tracked(), 3);

    // Changing the identifier moves the identity map entry
    let car = cars.first(conditions! { "id" => 1 }).unwrap().unwrap();
    car.set("id", 10).unwrap();
    cars.update(&car).unwrap();
    assert_eq!(cars.tracked(), 3);
    let moved = cars.first(conditions! { "id" => 10 }).unwrap().unwrap();
    assert!(moved.same(&car));
    let stored = cars.first(conditions! { "id" => 1 }).unwrap().unwrap();
    assert!(!stored.same(&car));
    assert_eq!(stored.get::<i64>("id").unwrap(), 1);
    assert_eq!(cars.tracked(), 4);

    // Delete drops the entry the entity was tracked with
    cars.delete(&car).unwrap();
    assert!(car.is_new());
    assert_eq!(cars.tracked(), 3);
    let stored_again = cars.first(conditions! { "id" => 1 }).unwrap().unwrap();
    assert!(stored_again.same(&stored));
    assert!(!stored_again.is_new());
    assert_eq!(stored_again.get::<i64>("id").unwrap(), 1);
}
