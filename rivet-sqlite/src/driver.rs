use crate::SqliteConnection;
use rivet_core::Driver;

#[derive(Debug, Default)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Backend = SqliteConnection;

    const NAME: &'static str = "sqlite";

    fn get_instance() -> Self {
        Self::new()
    }
}
