use crate::{
    CBox, SqliteDriver, SqlitePrepared, SqliteSqlWriter, error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_close, sqlite3_column_count, sqlite3_errmsg,
    sqlite3_finalize, sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2,
    sqlite3_step, sqlite3_stmt, sqlite3_total_changes64,
};
use rivet_core::{
    Backend, Driver, Error, ErrorContext, Executor, QueryResult, Result, RowLabeled, RowsAffected,
    SqlWriter, Statement, Value, truncate_long,
};
use std::{
    ffi::{CString, c_char},
    ptr,
    sync::Arc,
};

/// Connection to a sqlite database file (or `:memory:`).
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl SqliteConnection {
    fn last_error(&self) -> Error {
        unsafe { Error::msg(error_message_from_ptr(&sqlite3_errmsg(*self.connection)).to_string()) }
    }

    /// Compile the first statement of `sql`, returns it with the byte offset of the remaining text.
    fn prepare(&self, sql: &CString, start: usize) -> Result<Option<(SqlitePrepared, usize)>> {
        let bytes = sql.as_bytes();
        let mut statement = CBox::new(ptr::null_mut::<sqlite3_stmt>(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail: *const c_char = ptr::null();
        let rc = unsafe {
            let head = sql.as_ptr().add(start);
            sqlite3_prepare_v2(
                *self.connection,
                head,
                (bytes.len() - start) as _,
                &mut *statement,
                &mut tail,
            )
        };
        if rc != SQLITE_OK {
            return Err(self.last_error());
        }
        let next = if tail.is_null() {
            bytes.len()
        } else {
            tail as usize - sql.as_ptr() as usize
        };
        if statement.is_null() {
            // Only whitespace or comments were left
            return Ok(if next < bytes.len() && next > start {
                self.prepare(sql, next)?
            } else {
                None
            });
        }
        Ok(Some((SqlitePrepared::new(statement), next)))
    }

    fn step(&mut self, prepared: &SqlitePrepared, results: &mut Vec<QueryResult>) -> Result<()> {
        let statement = *prepared.statement;
        let changes = unsafe { sqlite3_total_changes64(*self.connection) };
        let count = unsafe { sqlite3_column_count(statement) };
        let labels = (0..count)
            .map(|i| extract_name(statement, i))
            .collect::<Result<Arc<[_]>>>()?;
        loop {
            match unsafe { sqlite3_step(statement) } {
                SQLITE_BUSY => continue,
                SQLITE_DONE => break,
                SQLITE_ROW => results.push(QueryResult::Row(RowLabeled::new(
                    labels.clone(),
                    (0..count)
                        .map(|i| extract_value(statement, i))
                        .collect::<Result<_>>()?,
                ))),
                _ => return Err(self.last_error()),
            }
        }
        if count == 0 {
            let (total, last) = unsafe {
                (
                    sqlite3_total_changes64(*self.connection),
                    sqlite3_last_insert_rowid(*self.connection),
                )
            };
            results.push(QueryResult::Affected(RowsAffected {
                rows_affected: (total - changes).max(0) as u64,
                last_affected_id: Some(last),
            }));
        }
        Ok(())
    }
}

impl Executor for SqliteConnection {
    fn sql_writer(&self) -> Box<dyn SqlWriter> {
        Box::new(SqliteSqlWriter::default())
    }

    fn run(&mut self, statement: &Statement) -> Result<Vec<QueryResult>> {
        let context = || format!("While running the query:\n{}", truncate_long!(statement.sql));
        let sql = CString::new(statement.sql.as_bytes())
            .map_err(Error::new)
            .with_context(|| "Could not create a CString from the query String")?;
        let mut parameters = statement.parameters.iter();
        let mut results = Vec::new();
        let mut start = 0;
        while let Some((mut prepared, next)) = self.prepare(&sql, start).with_context(context)? {
            for _ in 0..prepared.parameter_count() {
                let Some(value) = parameters.next() else {
                    return Err(Error::msg(format!(
                        "The query expects more than the {} parameters provided",
                        statement.parameters.len()
                    ))
                    .context(context()));
                };
                prepared.bind(value)?;
            }
            self.step(&prepared, &mut results).with_context(context)?;
            start = next;
        }
        if parameters.next().is_some() {
            return Err(Error::msg(format!(
                "The query uses fewer than the {} parameters provided",
                statement.parameters.len()
            ))
            .context(context()));
        }
        Ok(results)
    }

    fn last_insert_id(&mut self, sequence: Option<&str>) -> Result<Value> {
        if let Some(sequence) = sequence {
            return Err(Error::msg(format!(
                "Sqlite does not support named sequences, cannot read `{sequence}`"
            )));
        }
        Ok(Value::Int64(Some(unsafe {
            sqlite3_last_insert_rowid(*self.connection)
        })))
    }
}

impl Backend for SqliteConnection {
    fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let path = url.trim_start_matches(&prefix);
        let path = if path.contains('?') && !path.starts_with("file:") {
            format!("file:{path}")
        } else {
            path.to_string()
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let path = CString::new(path).map_err(Error::new).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                path.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        let result = Self { connection };
        if rc != SQLITE_OK {
            let error = if result.connection.is_null() {
                Error::msg("Could not allocate the sqlite connection")
            } else {
                result.last_error()
            }
            .context(format!("While opening `{url}`"));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(result)
    }
}
