use crate::{Car, CarMapper, Manufacturer, register_entities};
use rivet::{
    Connection, Definition, EntityType, ErrorKind, FieldSpec, RelationSpec, Value, conditions,
    data,
};

struct Boat;

impl EntityType for Boat {
    fn definition() -> Definition {
        Definition::new("boat")
            .field("id", FieldSpec::new("integer").primary())
            .mapper("harbor")
    }
}

struct Garage;

impl EntityType for Garage {
    fn definition() -> Definition {
        Definition::new("garage")
            .field("id", FieldSpec::new("integer").primary())
            .relation(
                "vehicles",
                RelationSpec::many_named("Vehicle", conditions! { "garage_id" => "this.id" }),
            )
    }
}

struct Broken;

impl EntityType for Broken {
    fn definition() -> Definition {
        Definition::new("broken")
            .field("id", FieldSpec::new("integer").primary())
            .relation(
                "cars",
                RelationSpec::many::<Car>(conditions! { "broken_id" => "this.uuid" }),
            )
    }
}

fn is_invalid_argument(error: &rivet::Error) -> bool {
    matches!(ErrorKind::of(error), Some(ErrorKind::InvalidArgument(..)))
}

pub fn connection(connection: &Connection) {
    // Custom mapper
    let car_mapper = CarMapper::default();
    register_entities(connection, car_mapper.clone());
    let cars = connection.mapper::<Car>().expect("Could not get the Car mapper");
    assert_eq!(cars.kind().name(), CarMapper::NAME);
    assert_eq!(
        connection.mapper::<Manufacturer>().unwrap().kind().name(),
        "default"
    );
    cars.find(conditions! {}).unwrap().run().unwrap();
    assert_eq!(car_mapper.loaded.get(), 12);

    // Mappers are created once
    let again = connection.mapper::<Car>().unwrap();
    assert_eq!(again.tracked(), 12);
    again.find(conditions! {}).unwrap().run().unwrap();
    assert_eq!(car_mapper.loaded.get(), 12);

    // Mapping errors
    let error = connection
        .mapper::<Boat>()
        .expect_err("The harbor mapper is not registered");
    assert!(is_invalid_argument(&error));
    let error = connection
        .mapper::<Broken>()
        .expect_err("uuid is not a field of Broken");
    assert!(is_invalid_argument(&error));
    let garage = connection
        .mapper::<Garage>()
        .unwrap()
        .entity(data! { "id" => 1 })
        .unwrap();
    let error = garage
        .related("vehicles")
        .expect_err("Vehicle is not registered");
    assert!(is_invalid_argument(&error));

    // Raw statements
    let affected = connection
        .execute("UPDATE car SET manufacturer_id = 4 WHERE manufacturer_id = 1")
        .expect("Could not update the cars");
    assert_eq!(affected.rows_affected, 3);
    connection
        .execute("INSERT INTO driver (name) VALUES ('Ayrton')")
        .unwrap();
    assert_eq!(
        connection.last_insert_id(None).unwrap(),
        Value::Int64(Some(3))
    );
    crate::silent_logs! {
        let error = connection
            .execute("SELECT * FROM hangar")
            .expect_err("hangar does not exist");
        assert!(ErrorKind::of(&error).is_none());
    }
}
