use rivet_core::{Context, SqlWriter};
use std::fmt::Write;

#[derive(Default, Debug)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_limit_offset(
        &self,
        _context: &mut Context,
        out: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
    ) {
        // Sqlite only accepts OFFSET after a LIMIT, a negative one means no limit
        match (limit, offset) {
            (Some(limit), _) => {
                let _ = write!(out, "\nLIMIT {limit}");
            }
            (None, Some(_)) => out.push_str("\nLIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {offset}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use rivet_core::SqlWriter;

    #[test]
    fn offset_without_limit() {
        let writer = SqliteSqlWriter::default();
        let mut out = String::new();
        writer.write_select(&mut out, "car", "", None, Some(3));
        assert_eq!(out, "SELECT *\nFROM \"car\"\nLIMIT -1\nOFFSET 3;");

        let mut out = String::new();
        writer.write_select(&mut out, "car", "\"id\" = ?", Some(2), Some(1));
        assert_eq!(
            out,
            "SELECT *\nFROM \"car\"\nWHERE \"id\" = ?\nLIMIT 2\nOFFSET 1;"
        );
    }
}
