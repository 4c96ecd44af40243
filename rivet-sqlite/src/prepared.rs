use crate::{CBox, SqliteSqlWriter, error_message_from_ptr};
use libsqlite3_sys::*;
use rivet_core::{Context, Error, Result, SqlWriter, Value, truncate_long};
use std::{
    ffi::{CStr, c_int},
    os::raw::{c_char, c_void},
};

/// Statement compiled by sqlite, parameters are bound one at a time starting from 1.
pub(crate) struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    pub(crate) index: c_int,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>) -> Self {
        unsafe {
            sqlite3_clear_bindings(*statement);
        }
        Self {
            statement,
            index: 1,
        }
    }

    /// Number of `?` placeholders in the statement.
    pub(crate) fn parameter_count(&self) -> usize {
        unsafe { sqlite3_bind_parameter_count(*self.statement) as usize }
    }

    pub(crate) fn bind(&mut self, value: &Value) -> Result<&mut Self> {
        let index = self.index;
        self.index += 1;
        self.bind_index(value, index)
    }

    fn bind_text(&self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }

    pub(crate) fn bind_index(&mut self, value: &Value, index: c_int) -> Result<&mut Self> {
        let writer = SqliteSqlWriter::default();
        let mut context = Context::default();
        let rc = unsafe {
            match value {
                v if v.is_null() => sqlite3_bind_null(*self.statement, index),
                Value::Boolean(Some(v)) => sqlite3_bind_int(*self.statement, index, *v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(*self.statement, index, *v as c_int),
                Value::Int64(Some(v)) => sqlite3_bind_int64(*self.statement, index, *v),
                Value::Float64(Some(v)) => sqlite3_bind_double(*self.statement, index, *v),
                Value::Decimal(Some(v)) => self.bind_text(index, &v.to_string()),
                Value::Varchar(Some(v)) => self.bind_text(index, v),
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    *self.statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Date(Some(v)) => {
                    let mut out = String::new();
                    writer.write_value_date(&mut context, &mut out, v, true);
                    self.bind_text(index, &out)
                }
                Value::Time(Some(v)) => {
                    let mut out = String::new();
                    writer.write_value_time(&mut context, &mut out, v, true);
                    self.bind_text(index, &out)
                }
                Value::Timestamp(Some(v)) => {
                    let mut out = String::new();
                    writer.write_value_date(&mut context, &mut out, &v.date(), true);
                    out.push(' ');
                    writer.write_value_time(&mut context, &mut out, &v.time(), true);
                    self.bind_text(index, &out)
                }
                Value::Uuid(Some(v)) => self.bind_text(index, &v.to_string()),
                _ => {
                    let error =
                        Error::msg(format!("Cannot use a {:?} as a query parameter", value));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            }
        };
        if rc != SQLITE_OK {
            let error = unsafe {
                let db = sqlite3_db_handle(*self.statement);
                let sql = sqlite3_sql(*self.statement);
                let sql = if sql.is_null() {
                    ""
                } else {
                    CStr::from_ptr(sql).to_str().unwrap_or_default()
                };
                Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string()).context(
                    format!(
                        "Cannot bind parameter {} to query:\n{}",
                        index,
                        truncate_long!(sql)
                    ),
                )
            };
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(self)
    }
}
