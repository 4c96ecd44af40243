mod connection;
mod entities;
mod fixtures;
mod identity;
mod mapper;
mod query;
mod relations;
mod upsert;

pub use entities::*;
pub use fixtures::*;

use log::LevelFilter;
use rivet::Connection;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run every scenario, each one on a fresh connection returned by `connect`
/// with the fixtures loaded.
pub fn execute_tests(connect: impl Fn() -> Connection) {
    let prepare = || {
        let connection = connect();
        register_entities(&connection, CarMapper::default());
        load_fixtures(&connection).expect("Could not load the fixtures");
        connection
    };
    mapper::mapper(&prepare());
    mapper::delete(&prepare());
    query::query(&prepare());
    query::window(&prepare());
    relations::relations(&prepare());
    relations::through(&prepare());
    identity::identity(&prepare());
    upsert::upsert(&prepare());
    connection::connection(&prepare());
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
