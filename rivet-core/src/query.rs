use crate::{
    ClauseContext, Collection, Conditions, Connection, Entity, ErrorKind, Glue, Mapper,
    OperatorRegistry, Result, RowLabeled, Statement, Value, compile, error::invalid_argument,
    error::method_not_found,
};
use std::{
    cell::RefCell,
    fmt::{self, Debug},
    rc::Rc,
};

/// Rows fetched by one execution of a [`Query`].
#[derive(Debug)]
pub struct ResultSet {
    pub rows: Vec<RowLabeled>,
    /// The rows converted by the mapper, when the query has one.
    pub entities: Option<Collection>,
}

/// Composable `SELECT` over one table.
///
/// Builder methods consume and return the query, any of them drops the
/// cached result. Execution happens on first read and the result is reused
/// until the query changes.
/// ```rust,ignore
/// let cars = connection
///     .mapper::<Car>()?
///     .find(conditions! { "manufacturer_id" => 2 })?
///     .or_where(conditions! { "name like" => "A%" })?
///     .limit(3)
///     .run()?;
/// ```
#[derive(Clone)]
pub struct Query {
    connection: Connection,
    mapper: Option<Mapper>,
    table: String,
    predicate: String,
    parameters: Vec<Value>,
    limit: Option<u64>,
    offset: Option<u64>,
    result: RefCell<Option<Rc<ResultSet>>>,
}

impl Query {
    pub(crate) fn new(connection: Connection, table: impl Into<String>) -> Self {
        Self {
            connection,
            mapper: None,
            table: table.into(),
            predicate: String::new(),
            parameters: Vec::new(),
            limit: None,
            offset: None,
            result: RefCell::new(None),
        }
    }

    /// Convert the rows into entities with `mapper`.
    pub fn with_mapper(mut self, mapper: Mapper) -> Self {
        self.mapper = Some(mapper);
        self.invalidate();
        self
    }

    pub fn mapper(&self) -> Option<&Mapper> {
        self.mapper.as_ref()
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    /// The compiled predicate, empty when unfiltered.
    pub fn clause(&self) -> &str {
        &self.predicate
    }
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Same as [`Query::and_where`].
    pub fn where_(self, conditions: Conditions) -> Result<Self> {
        self.and_where(conditions)
    }

    /// Add `conditions` joined by `AND`, both inside the map and with the existing predicate.
    pub fn and_where(self, conditions: Conditions) -> Result<Self> {
        self.combine(&conditions, Glue::And)
    }

    /// Add `conditions` joined by `OR`, both inside the map and with the existing predicate.
    pub fn or_where(self, conditions: Conditions) -> Result<Self> {
        self.combine(&conditions, Glue::Or)
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("eq", field, value.into())
    }
    pub fn not(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("not", field, value.into())
    }
    pub fn gt(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("gt", field, value.into())
    }
    pub fn gte(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("gte", field, value.into())
    }
    pub fn lt(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("lt", field, value.into())
    }
    pub fn lte(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("lte", field, value.into())
    }
    pub fn like(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with("like", field, value.into())
    }

    /// Add `field <alias> value` with `AND`, unknown aliases fail with [`ErrorKind::MethodNotFound`].
    pub fn predicate(self, alias: &str, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.predicate_with(alias, field, value.into())
    }

    fn predicate_with(self, alias: &str, field: &str, value: Value) -> Result<Self> {
        if OperatorRegistry::global().get(alias).is_none() {
            return Err(method_not_found("Query", alias));
        }
        let mut conditions = Conditions::new();
        conditions.push(format!("{field} {alias}"), value);
        self.combine(&conditions, Glue::And)
    }

    fn combine(mut self, conditions: &Conditions, glue: Glue) -> Result<Self> {
        if conditions.is_empty() {
            return Ok(self);
        }
        let mut context = ClauseContext::new(self.connection.sql_writer());
        let compiled = compile(conditions, glue, OperatorRegistry::global(), &mut context)?;
        if compiled.is_empty() {
            return Ok(self);
        }
        let parameters = context.into_parameters();
        self.predicate = if self.predicate.is_empty() {
            compiled
        } else {
            format!("({}){}({})", self.predicate, glue.as_sql(), compiled)
        };
        self.parameters.extend(parameters);
        self.invalidate();
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self.invalidate();
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.result.get_mut().take();
    }

    /// The `SELECT` statement this query executes.
    pub fn statement(&self) -> Statement {
        let mut sql = String::new();
        self.connection.sql_writer().write_select(
            &mut sql,
            &self.table,
            &self.predicate,
            self.limit,
            self.offset,
        );
        Statement::new(sql, self.parameters.clone())
    }

    /// The `SELECT COUNT(*)` statement, without the result window.
    pub fn count_statement(&self) -> Statement {
        let mut sql = String::new();
        self.connection
            .sql_writer()
            .write_select_count(&mut sql, &self.table, &self.predicate);
        Statement::new(sql, self.parameters.clone())
    }

    /// Execute unless the result is already cached.
    pub fn execute(&self) -> Result<Rc<ResultSet>> {
        if let Some(result) = self.result.borrow().as_ref() {
            return Ok(result.clone());
        }
        let rows = self.connection.fetch(&self.statement())?;
        let entities = match &self.mapper {
            Some(mapper) => Some(mapper.collection(&rows)?),
            None => None,
        };
        let result = Rc::new(ResultSet { rows, entities });
        *self.result.borrow_mut() = Some(result.clone());
        Ok(result)
    }

    /// Entities selected by the query.
    pub fn run(&self) -> Result<Collection> {
        if self.mapper.is_none() {
            return Err(invalid_argument(format!(
                "The query on `{}` has no mapper, use `rows` to read it",
                self.table
            )));
        }
        Ok(self.execute()?.entities.clone().unwrap_or_default())
    }

    /// The raw rows selected by the query.
    pub fn rows(&self) -> Result<Vec<RowLabeled>> {
        Ok(self.execute()?.rows.clone())
    }

    /// Force `LIMIT 1` and return the sole entity, if any.
    pub fn first(&mut self) -> Result<Option<Entity>> {
        if self.limit != Some(1) {
            self.limit = Some(1);
            self.invalidate();
        }
        Ok(self.run()?.first().cloned())
    }

    /// `exact` runs a `COUNT(*)` ignoring limit and offset, otherwise it
    /// counts the materialized result.
    pub fn count(&self, exact: bool) -> Result<usize> {
        if !exact {
            return Ok(self.execute()?.rows.len());
        }
        let rows = self.connection.fetch(&self.count_statement())?;
        let count = rows
            .first()
            .and_then(|v| v.values().first())
            .cloned()
            .unwrap_or(Value::Int64(Some(0)));
        Ok(<i64 as crate::AsValue>::try_from_value(count)? as usize)
    }

    pub fn get(&self, index: usize) -> Result<Option<Entity>> {
        Ok(self.run()?.get(index).cloned())
    }

    pub fn iter(&self) -> Result<impl Iterator<Item = Entity>> {
        Ok(self.run()?.into_iter())
    }

    /// Query results are read-only, this always fails with [`ErrorKind::ReadOnlyViolation`].
    pub fn set(&self, index: usize, _entity: Entity) -> Result<()> {
        let error = crate::Error::new(ErrorKind::ReadOnlyViolation(format!(
            "the result of the query on `{}` (index {index})",
            self.table
        )));
        log::debug!("{:#}", error);
        Err(error)
    }
}

impl Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("predicate", &self.predicate)
            .field("parameters", &self.parameters)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}
