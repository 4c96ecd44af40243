use rivet::{
    Connection, Definition, Entity, EntityType, FieldSpec, Mapper, MapperKind, RelationSpec,
    Result, Value, conditions,
};
use std::{cell::Cell, rc::Rc};

pub struct Manufacturer;

impl EntityType for Manufacturer {
    fn definition() -> Definition {
        Definition::new("manufacturer")
            .field("id", FieldSpec::new("integer").primary().sequence())
            .field("name", FieldSpec::new("string").require().display("Name"))
            .field("stock_price", "float")
            .field("founding_year", "integer")
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
            .field("name", FieldSpec::new("string").require())
            .field("manufacturer_id", "integer")
            .relation(
                "manufacturer",
                RelationSpec::one::<Manufacturer>(conditions! { "id" => "this.manufacturer_id" }),
            )
            .relation(
                "data_sheet",
                RelationSpec::one::<DataSheet>(conditions! { "car_id" => "this.id" }),
            )
            .relation(
                "drivers",
                RelationSpec::many_named("Driver", conditions! { "car_id" => "this.id" })
                    .through("car_driver.driver_id"),
            )
            .mapper(CarMapper::NAME)
    }
}

pub struct Driver;

impl EntityType for Driver {
    fn definition() -> Definition {
        Definition::new("driver")
            .field("id", FieldSpec::new("integer").primary().sequence())
            .field("name", "string")
            .relation(
                "cars",
                RelationSpec::many::<Car>(conditions! { "driver_id" => "this.id" })
                    .through("car_driver.car_id"),
            )
    }
}

pub struct DataSheet;

impl EntityType for DataSheet {
    fn definition() -> Definition {
        Definition::new("data_sheet")
            .field("id", FieldSpec::new("integer").primary().sequence())
            .field("horsepower", FieldSpec::new("integer").default(0))
            .field("car_id", "integer")
            .relation(
                "car",
                RelationSpec::one::<Car>(conditions! { "id" => "this.car_id" }),
            )
    }
}

/// Mapper of [`Car`]: trims the name before inserting and counts the loaded rows.
#[derive(Default, Clone)]
pub struct CarMapper {
    pub loaded: Rc<Cell<usize>>,
}

impl CarMapper {
    pub const NAME: &'static str = "car";
}

impl MapperKind for CarMapper {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_insert(&self, _mapper: &Mapper, entity: &Entity) -> Result<()> {
        if let Some(name) = entity.value("name")?.as_str() {
            let trimmed = name.trim();
            if trimmed.len() != name.len() {
                entity.set("name", Value::from(trimmed))?;
            }
        }
        Ok(())
    }

    fn after_load(&self, _mapper: &Mapper, _entity: &Entity) -> Result<()> {
        self.loaded.set(self.loaded.get() + 1);
        Ok(())
    }
}

/// Register the test entity types and the car mapper on `connection`.
pub fn register_entities(connection: &Connection, car_mapper: CarMapper) {
    connection
        .register::<Manufacturer>()
        .register::<Car>()
        .register::<Driver>()
        .register::<DataSheet>()
        .register_mapper(CarMapper::NAME, move || Box::new(car_mapper.clone()));
}
