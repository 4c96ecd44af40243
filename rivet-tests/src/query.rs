use crate::{Car, Manufacturer};
use rivet::{Connection, Entity, ErrorKind, conditions};

fn names(entities: impl IntoIterator<Item = Entity>) -> Vec<String> {
    entities
        .into_iter()
        .map(|v| v.get::<String>("name").expect("Every fixture has a name"))
        .collect()
}

pub fn query(connection: &Connection) {
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    let manufacturers = connection
        .mapper::<Manufacturer>()
        .expect("Could not get the Manufacturer mapper");

    // Equality
    let bmw = cars.find(conditions! { "manufacturer_id" => 2 }).unwrap();
    assert_eq!(bmw.count(false).unwrap(), 3);
    assert_eq!(
        names(bmw.iter().unwrap()),
        ["1 Series 3-door", "M4 Coupé", "i8"]
    );
    assert_eq!(
        bmw.get(1).unwrap().map(|v| v.get::<String>("name").unwrap()),
        Some("M4 Coupé".into())
    );
    assert!(bmw.get(3).unwrap().is_none());

    // Operators
    let young = manufacturers
        .find(conditions! { "founding_year >" => 1920 })
        .unwrap();
    assert_eq!(names(young.run().unwrap()), ["Mercedes Benz", "Volkswagen"]);
    let starting_with_a = cars.find(conditions! { "name like" => "A%" }).unwrap();
    assert_eq!(
        names(starting_with_a.run().unwrap()),
        ["A3 Sedan", "A8 L W12", "A-Class", "AMG GT"]
    );
    let listed = cars.find(conditions! { "id" => vec![1, 2, 3] }).unwrap();
    assert_eq!(listed.count(true).unwrap(), 3);
    let excluded = cars.find(conditions! { "id not" => vec![1, 2, 3] }).unwrap();
    assert_eq!(excluded.count(true).unwrap(), 9);
    let different = cars.find(conditions! { "id !=" => 1 }).unwrap();
    assert_eq!(different.count(true).unwrap(), 11);
    let range = manufacturers
        .find(conditions! {
            "founding_year greaterThanOrEquals" => 1916,
            "founding_year lt" => 1937,
        })
        .unwrap();
    assert_eq!(names(range.run().unwrap()), ["BMW", "Mercedes Benz"]);

    // Nested groups
    let nested = cars
        .find(conditions! {
            "or" => {
                "manufacturer_id" => 1,
                "name" => "i8",
            },
        })
        .unwrap();
    assert_eq!(nested.count(true).unwrap(), 4);
    let deeper = cars
        .find(conditions! {
            "or" => {
                "and" => { "manufacturer_id" => 1, "name like" => "A%" },
                "manufacturer_id" => 4,
            },
        })
        .unwrap();
    assert_eq!(
        names(deeper.run().unwrap()),
        ["A3 Sedan", "A8 L W12", "Beetle", "Golf GTI", "Passat"]
    );

    // Chaining
    let chained = cars
        .find(conditions! { "manufacturer_id" => 1 })
        .unwrap()
        .or_where(conditions! { "manufacturer_id" => 4 })
        .unwrap();
    assert_eq!(chained.count(true).unwrap(), 6);
    let narrowed = cars
        .find(conditions! {})
        .unwrap()
        .gt("id", 3)
        .unwrap()
        .like("name", "%Class")
        .unwrap();
    assert_eq!(names(narrowed.run().unwrap()), ["A-Class", "S-Class"]);
    let predicate = cars
        .find(conditions! {})
        .unwrap()
        .predicate("lte", "id", 2)
        .unwrap();
    assert_eq!(predicate.count(true).unwrap(), 2);

    // Unknown operators
    let error = cars
        .find(conditions! {})
        .unwrap()
        .predicate("between", "id", 1)
        .expect_err("between is not an operator");
    assert!(matches!(
        ErrorKind::of(&error),
        Some(ErrorKind::MethodNotFound { owner, method }) if owner == "Query" && method == "between"
    ));
    let error = cars
        .find(conditions! { "id ~" => 1 })
        .expect_err("~ is not an operator");
    assert!(matches!(
        ErrorKind::of(&error),
        Some(ErrorKind::InvalidArgument(..))
    ));

    // First
    let mut mercedes = cars.find(conditions! { "manufacturer_id" => 3 }).unwrap();
    let first = mercedes.first().unwrap().expect("Mercedes has cars");
    assert_eq!(first.get::<String>("name").unwrap(), "A-Class");
    assert!(mercedes.statement().sql.ends_with("LIMIT 1;"));
    assert!(
        cars.find(conditions! { "manufacturer_id" => 99 })
            .unwrap()
            .first()
            .unwrap()
            .is_none()
    );

    // Read only
    let error = bmw
        .set(0, first)
        .expect_err("The query result is read only");
    assert!(matches!(
        ErrorKind::of(&error),
        Some(ErrorKind::ReadOnlyViolation(..))
    ));

    // Unmapped
    let links = connection
        .select("car_driver", conditions! { "driver_id" => 1 })
        .unwrap();
    let rows = links.rows().expect("Could not read car_driver");
    assert_eq!(rows.len(), 2);
    assert!(links.run().is_err());
}

pub fn window(connection: &Connection) {
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    let all = cars.find(conditions! {}).unwrap();
    assert_eq!(all.count(false).unwrap(), 12);

    let limited = all.clone().limit(5);
    assert_eq!(limited.count(false).unwrap(), 5);
    assert_eq!(limited.count(true).unwrap(), 12);

    let tail = all.clone().offset(10);
    assert_eq!(names(tail.run().unwrap()), ["Golf GTI", "Passat"]);

    let page = all.limit(2).offset(2);
    assert_eq!(names(page.run().unwrap()), ["A8 L W12", "1 Series 3-door"]);
}
