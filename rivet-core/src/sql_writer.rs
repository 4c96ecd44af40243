use crate::{Value, separated_by};
use std::fmt::Write;
use time::{Date, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else {
            let _ = write!($out, "'{}'", $value);
        }
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Placeholders written so far.
    pub counter: u32,
    /// Keep the `table.` qualifier of column references.
    pub qualify_columns: bool,
}

impl Context {
    pub fn new(qualify_columns: bool) -> Self {
        Self {
            counter: 0,
            qualify_columns,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(true)
    }
}

/// Dialect printer converting statements into concrete SQL strings.
///
/// Values always travel as bound parameters, `write_value` is only used to
/// render printable statements.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a possibly schema qualified table name (`schema.table`).
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &str) {
        separated_by(
            out,
            value.split('.'),
            |out, v| self.write_identifier_quoted(context, out, v),
            ".",
        );
    }

    /// Render a column reference, `table.column` keeps the qualifier only when the context asks for it.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, value: &str) {
        match value.rsplit_once('.') {
            Some((table, column)) if context.qualify_columns => {
                self.write_table_ref(context, out, table);
                out.push('.');
                self.write_identifier_quoted(context, out, column);
            }
            Some((_, column)) => self.write_identifier_quoted(context, out, column),
            None => self.write_identifier_quoted(context, out, value),
        }
    }

    /// Render the placeholder of the next bound parameter.
    fn write_placeholder(&self, context: &mut Context, out: &mut String) {
        context.counter += 1;
        out.push('?');
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, context: &mut Context, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(context, out),
            Value::Boolean(Some(v)) => self.write_value_bool(context, out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Decimal(Some(v)) => {
                let _ = write!(out, "{}", v);
            }
            Value::Varchar(Some(v)) => self.write_value_string(context, out, v),
            Value::Blob(Some(v)) => self.write_value_blob(context, out, v.as_ref()),
            Value::Date(Some(v)) => self.write_value_date(context, out, v, false),
            Value::Time(Some(v)) => self.write_value_time(context, out, v, false),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(context, out, v),
            Value::Uuid(Some(v)) => {
                let _ = write!(out, "'{}'", v);
            }
            Value::List(Some(v)) => {
                out.push('(');
                separated_by(out, v, |out, v| self.write_value(context, out, v), ", ");
                out.push(')');
            }
            _ => log::error!("Cannot write {:?}", value),
        }
    }

    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, _context: &mut Context, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(context, out, value, '\'', "''");
        out.push('\'');
    }

    /// Render a blob literal using hex escapes.
    fn write_value_blob(&self, _context: &mut Context, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }

    fn write_value_date(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Date,
        timestamp: bool,
    ) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:04}-{:02}-{:02}{b}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Time,
        timestamp: bool,
    ) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second(),
        );
        let mut subsecond = value.nanosecond();
        if subsecond != 0 {
            let mut width = 9;
            while subsecond % 10 == 0 {
                subsecond /= 10;
                width -= 1;
            }
            let _ = write!(out, ".{:0width$}", subsecond);
        }
        out.push_str(b);
    }

    fn write_value_timestamp(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &PrimitiveDateTime,
    ) {
        out.push('\'');
        self.write_value_date(context, out, &value.date(), true);
        out.push(' ');
        self.write_value_time(context, out, &value.time(), true);
        out.push('\'');
    }

    /// Render the result window.
    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        if let Some(limit) = limit {
            out.push_str("\nLIMIT ");
            write_integer!(out, limit);
        }
        if let Some(offset) = offset {
            out.push_str("\nOFFSET ");
            write_integer!(out, offset);
        }
    }

    /// Emit `SELECT *`, `predicate` is an already compiled clause (empty when unfiltered).
    fn write_select(
        &self,
        out: &mut String,
        table: &str,
        predicate: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        out.reserve(64 + table.len() + predicate.len());
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT *\nFROM ");
        let mut context = Context::new(false);
        self.write_table_ref(&mut context, out, table);
        if !predicate.is_empty() {
            out.push_str("\nWHERE ");
            out.push_str(predicate);
        }
        self.write_limit_offset(&mut context, out, limit, offset);
        out.push(';');
    }

    /// Emit `SELECT COUNT(*)`, no result window.
    fn write_select_count(&self, out: &mut String, table: &str, predicate: &str) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT COUNT(*) AS \"count\"\nFROM ");
        let mut context = Context::new(false);
        self.write_table_ref(&mut context, out, table);
        if !predicate.is_empty() {
            out.push_str("\nWHERE ");
            out.push_str(predicate);
        }
        out.push(';');
    }

    /// Emit a single row INSERT with one placeholder per column.
    fn write_insert(&self, out: &mut String, table: &str, columns: &[&str]) {
        out.reserve(64 + table.len() + columns.len() * 24);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("INSERT INTO ");
        let mut context = Context::new(false);
        self.write_table_ref(&mut context, out, table);
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES;");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(&mut context, out, v),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            columns,
            |out, _| self.write_placeholder(&mut context, out),
            ", ",
        );
        out.push_str(");");
    }

    /// Emit UPDATE, the SET placeholders precede the ones of `predicate`.
    fn write_update(&self, out: &mut String, table: &str, columns: &[&str], predicate: &str) {
        out.reserve(64 + table.len() + columns.len() * 24 + predicate.len());
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("UPDATE ");
        let mut context = Context::new(false);
        self.write_table_ref(&mut context, out, table);
        out.push_str(" SET\n");
        separated_by(
            out,
            columns,
            |out, v| {
                self.write_identifier_quoted(&mut context, out, v);
                out.push_str(" = ");
                self.write_placeholder(&mut context, out);
            },
            ",\n",
        );
        out.push_str("\nWHERE ");
        out.push_str(predicate);
        out.push(';');
    }

    /// Emit DELETE statement with WHERE clause.
    fn write_delete(&self, out: &mut String, table: &str, predicate: &str) {
        out.reserve(64 + table.len() + predicate.len());
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DELETE FROM ");
        let mut context = Context::new(false);
        self.write_table_ref(&mut context, out, table);
        out.push_str("\nWHERE ");
        out.push_str(predicate);
        out.push(';');
    }
}

/// Fallback generic SQL writer (closest to PostgreSQL conventions).
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
