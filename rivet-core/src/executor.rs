use crate::{QueryResult, Result, RowLabeled, RowsAffected, SqlWriter, Statement, Value};

/// Live database handle that runs parameterized statements.
pub trait Executor {
    /// Dialect printer used to render statements for this backend.
    fn sql_writer(&self) -> Box<dyn SqlWriter>;

    /// General method to send any statement and return any result type (either row or count).
    fn run(&mut self, statement: &Statement) -> Result<Vec<QueryResult>>;

    /// Execute the statement and returns the rows.
    fn fetch(&mut self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        Ok(self
            .run(statement)?
            .into_iter()
            .filter_map(|v| match v {
                QueryResult::Row(v) => Some(v),
                _ => None,
            })
            .collect())
    }

    /// Execute the statement and return the total number of rows affected.
    fn execute(&mut self, statement: &Statement) -> Result<RowsAffected> {
        let mut result = RowsAffected::default();
        result.extend(self.run(statement)?.into_iter().filter_map(|v| match v {
            QueryResult::Affected(v) => Some(v),
            _ => None,
        }));
        Ok(result)
    }

    /// Value last generated by `sequence`, or by the last insert when `None`.
    fn last_insert_id(&mut self, sequence: Option<&str>) -> Result<Value>;
}
