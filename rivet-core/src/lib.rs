mod as_value;
mod collection;
mod conditions;
mod connection;
mod driver;
mod entity;
mod error;
mod executor;
mod field_type;
mod identity;
mod mapper;
mod mapping;
mod operator;
mod query;
mod sql_writer;
mod statement;
mod util;
mod value;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use collection::*;
pub use conditions::*;
pub use connection::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field_type::*;
pub use identity::*;
pub use mapper::*;
pub use mapping::*;
pub use operator::*;
pub use query::*;
pub use sql_writer::*;
pub use statement::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
