use crate::Manufacturer;
use rivet::{Connection, Value, conditions, data};

pub fn upsert(connection: &Connection) {
    let manufacturers = connection
        .mapper::<Manufacturer>()
        .expect("Could not get the Manufacturer mapper");

    // Existing row
    let audi = manufacturers
        .upsert(
            data! { "stock_price" => 70000.0 },
            conditions! { "name" => "Audi" },
        )
        .expect("Could not upsert Audi");
    assert_eq!(audi.get::<i64>("id").unwrap(), 1);
    assert!(!audi.is_dirty());
    let rows = connection
        .select("manufacturer", conditions! { "id" => 1 })
        .unwrap()
        .rows()
        .unwrap();
    assert_eq!(
        rows[0].get_column("stock_price"),
        Some(&Value::Float64(Some(70000.0)))
    );
    assert_eq!(rows[0].get_column("founding_year"), Some(&Value::Int64(Some(1909))));

    // Missing row
    let porsche = manufacturers
        .upsert(
            data! { "name" => "Porsche", "founding_year" => 1931 },
            conditions! { "name" => "Porsche" },
        )
        .expect("Could not upsert Porsche");
    assert!(!porsche.is_new());
    assert_eq!(porsche.get::<i64>("id").unwrap(), 5);
    assert_eq!(
        manufacturers
            .find(conditions! {})
            .unwrap()
            .count(true)
            .unwrap(),
        5
    );

    // Same conditions again, the tracked entity is updated
    let again = manufacturers
        .upsert(
            data! { "stock_price" => 160.0 },
            conditions! { "id" => 5 },
        )
        .unwrap();
    assert!(again.same(&porsche));
    assert_eq!(porsche.get::<f64>("stock_price").unwrap(), 160.0);

    // A second miss creates a second row
    let ferrari = manufacturers
        .upsert(
            data! { "name" => "Ferrari", "founding_year" => 1939 },
            conditions! { "name" => "Ferrari" },
        )
        .expect("Could not upsert Ferrari");
    assert!(!ferrari.same(&porsche));
    assert_eq!(ferrari.get::<i64>("id").unwrap(), 6);
    assert_eq!(
        manufacturers
            .find(conditions! {})
            .unwrap()
            .count(true)
            .unwrap(),
        6
    );

    // Clean entities are not written
    manufacturers.update(&porsche).expect("Updating a clean entity is a no-op");
}
