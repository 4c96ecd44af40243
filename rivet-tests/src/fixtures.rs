use rivet::{Connection, Result};

/// Tables of the test entities, in creation order.
pub const SCHEMA: &[&str] = &[
    "DROP TABLE IF EXISTS car_driver",
    "DROP TABLE IF EXISTS data_sheet",
    "DROP TABLE IF EXISTS driver",
    "DROP TABLE IF EXISTS car",
    "DROP TABLE IF EXISTS manufacturer",
    "CREATE TABLE manufacturer (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        stock_price REAL,
        founding_year INTEGER
    )",
    "CREATE TABLE car (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        manufacturer_id INTEGER NOT NULL
    )",
    "CREATE TABLE driver (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    "CREATE TABLE car_driver (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        car_id INTEGER NOT NULL,
        driver_id INTEGER NOT NULL
    )",
    "CREATE TABLE data_sheet (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        horsepower INTEGER NOT NULL,
        car_id INTEGER NOT NULL
    )",
];

pub const FIXTURES: &[&str] = &[
    "INSERT INTO manufacturer (name, stock_price, founding_year) VALUES
        ('Audi', 60700, 1909),
        ('BMW', 6897, 1916),
        ('Mercedes Benz', 5587, 1926),
        ('Volkswagen', 11875, 1937)",
    "INSERT INTO car (name, manufacturer_id) VALUES
        ('A3 Sedan', 1),
        ('S4', 1),
        ('A8 L W12', 1),
        ('1 Series 3-door', 2),
        ('M4 Coupé', 2),
        ('i8', 2),
        ('A-Class', 3),
        ('AMG GT', 3),
        ('S-Class', 3),
        ('Beetle', 4),
        ('Golf GTI', 4),
        ('Passat', 4)",
    "INSERT INTO driver (name) VALUES ('Marco'), ('Jesus')",
    "INSERT INTO car_driver (car_id, driver_id) VALUES (5, 1), (8, 1)",
    "INSERT INTO data_sheet (horsepower, car_id) VALUES (220, 1)",
];

/// Recreate the tables and insert the fixture rows.
pub fn load_fixtures(connection: &Connection) -> Result<()> {
    for statement in SCHEMA.iter().chain(FIXTURES) {
        connection.execute(*statement)?;
    }
    Ok(())
}
