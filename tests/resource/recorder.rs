use rivet::{
    Executor, GenericSqlWriter, QueryResult, Result, RowLabeled, RowsAffected, SqlWriter,
    Statement, Value,
};
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    sync::Arc,
};

/// Executor that records the statements it receives and answers with scripted rows.
///
/// Statements without a scripted answer return no rows, an `INSERT` also
/// advances the generated identifier.
#[derive(Default, Clone)]
pub struct Recorder {
    statements: Rc<RefCell<Vec<Statement>>>,
    answers: Rc<RefCell<VecDeque<Vec<QueryResult>>>>,
    last_id: Rc<Cell<i64>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next statement with `rows`.
    pub fn answer(&self, labels: &[&str], rows: Vec<Vec<Value>>) -> &Self {
        let labels: Arc<[String]> = labels.iter().map(|v| v.to_string()).collect();
        self.answers.borrow_mut().push_back(
            rows.into_iter()
                .map(|v| QueryResult::Row(RowLabeled::new(labels.clone(), v.into())))
                .collect(),
        );
        self
    }

    pub fn starting_id(&self, id: i64) -> &Self {
        self.last_id.set(id);
        self
    }

    /// Statements received so far, the log is cleared.
    pub fn take(&self) -> Vec<Statement> {
        self.statements.take()
    }
}

impl Executor for Recorder {
    fn sql_writer(&self) -> Box<dyn SqlWriter> {
        Box::new(GenericSqlWriter::new())
    }

    fn run(&mut self, statement: &Statement) -> Result<Vec<QueryResult>> {
        self.statements.borrow_mut().push(statement.clone());
        if let Some(answer) = self.answers.borrow_mut().pop_front() {
            return Ok(answer);
        }
        if statement.sql.starts_with("INSERT") {
            self.last_id.set(self.last_id.get() + 1);
            return Ok(vec![QueryResult::Affected(RowsAffected {
                rows_affected: 1,
                last_affected_id: Some(self.last_id.get()),
            })]);
        }
        Ok(Vec::new())
    }

    fn last_insert_id(&mut self, sequence: Option<&str>) -> Result<Value> {
        Ok(match sequence {
            Some(..) => Value::Int64(Some(self.last_id.get() * 100)),
            None => Value::Int64(Some(self.last_id.get())),
        })
    }
}
