use rivet::{Definition, EntityType, FieldSpec, RelationSpec, conditions};

pub struct Manufacturer;

impl EntityType for Manufacturer {
    fn definition() -> Definition {
        Definition::new("manufacturer")
            .field("id", FieldSpec::new("integer").primary().sequence())
            .field("name", FieldSpec::new("string").require())
            .field("stock_price", "decimal")
            .field("founding_year", FieldSpec::new("integer").default(1900))
            .relation(
                "cars",
                RelationSpec::many::<Car>(conditions! { "manufacturer_id" => "this.id" }),
            )
    }
}

pub struct Car;

impl EntityType for Car {
    fn definition() -> Definition {
        Definition::new("car")
            .field("id", FieldSpec::new("integer").primary().sequence())
            .field("name", "string")
            .field("manufacturer_id", "integer")
            .relation(
                "manufacturer",
                RelationSpec::one::<Manufacturer>(conditions! { "id" => "this.manufacturer_id" }),
            )
            .relation(
                "drivers",
                RelationSpec::many_named("Driver", conditions! { "car_id" => "this.id" })
                    .through("car_driver.driver_id"),
            )
    }
}

pub struct Driver;

impl EntityType for Driver {
    fn definition() -> Definition {
        Definition::new("driver")
            .field("id", FieldSpec::new("integer").primary().sequence())
            .field("name", "string")
    }
}

/// Composite identifier, no sequence.
pub struct Lap;

impl EntityType for Lap {
    fn definition() -> Definition {
        Definition::new("lap")
            .field("driver_id", FieldSpec::new("integer").primary())
            .field("number", FieldSpec::new("integer").primary())
            .field("seconds", "float")
    }
}

/// Fed by a named sequence.
pub struct Ticket;

impl EntityType for Ticket {
    fn definition() -> Definition {
        Definition::new("race.ticket")
            .field(
                "code",
                FieldSpec::new("bigint").primary().sequence_named("ticket_code_seq"),
            )
            .field("issued", "datetime")
            .field("holder", FieldSpec::new("guid").display("Ticket holder").require())
    }
}
