use crate::{
    Conditions, DefaultMapper, Driver, EntityRef, EntityType, ErrorContext, Executor, Mapper,
    MapperKind, Mapping, Query, RelationTarget, Result, RowLabeled, RowsAffected, SqlWriter,
    Statement, Value, error::invalid_argument,
};
use std::{
    any::TypeId,
    cell::RefCell,
    collections::HashMap,
    fmt::{self, Debug},
    rc::{Rc, Weak},
};

type MapperFactory = Rc<dyn Fn() -> Box<dyn MapperKind>>;

pub(crate) struct ConnectionInner {
    executor: RefCell<Box<dyn Executor>>,
    writer: Box<dyn SqlWriter>,
    mappings: RefCell<HashMap<TypeId, Rc<Mapping>>>,
    mappers: RefCell<HashMap<TypeId, Mapper>>,
    entities: RefCell<HashMap<String, EntityRef>>,
    kinds: RefCell<HashMap<String, MapperFactory>>,
}

/// Entry point: owns the backend and hands out mappers and queries bound to it.
///
/// Cloning shares the same connection. Mappers, the identity maps they hold
/// and the mapping cache live as long as the connection.
#[derive(Clone)]
pub struct Connection(Rc<ConnectionInner>);

impl Connection {
    pub fn new(executor: impl Executor + 'static) -> Self {
        let writer = executor.sql_writer();
        let connection = Self(Rc::new(ConnectionInner {
            executor: RefCell::new(Box::new(executor)),
            writer,
            mappings: Default::default(),
            mappers: Default::default(),
            entities: Default::default(),
            kinds: Default::default(),
        }));
        connection.register_mapper(DefaultMapper::NAME, || Box::new(DefaultMapper));
        connection
    }

    /// Connect with the driver `D`, the url must start with `D::NAME` followed by `://`.
    pub fn open<D: Driver>(url: &str) -> Result<Self> {
        let prefix = format!("{}://", D::NAME);
        if !url.starts_with(&prefix) {
            return Err(invalid_argument(format!(
                "Expected a {} connection url starting with `{prefix}`, got `{url}`",
                D::NAME
            )));
        }
        let backend = D::get_instance()
            .connect(url)
            .with_context(|| format!("While connecting to `{url}`"))?;
        log::debug!("Connected to {url}");
        Ok(Self::new(backend))
    }

    pub(crate) fn from_weak(inner: &Weak<ConnectionInner>) -> Result<Self> {
        inner
            .upgrade()
            .map(Connection)
            .ok_or_else(|| invalid_argument("The connection was closed"))
    }

    fn downgrade(&self) -> Weak<ConnectionInner> {
        Rc::downgrade(&self.0)
    }

    pub fn sql_writer(&self) -> &dyn SqlWriter {
        self.0.writer.as_dyn()
    }

    pub fn fetch(&self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        log::debug!("{}", statement);
        self.0
            .executor
            .borrow_mut()
            .fetch(statement)
            .inspect_err(|e| log::error!("{:#}", e))
            .with_context(|| format!("While fetching the rows of: {}", statement))
    }

    /// Run a statement that does not return rows, plain SQL converts into a [`Statement`].
    pub fn execute(&self, statement: impl Into<Statement>) -> Result<RowsAffected> {
        let statement = statement.into();
        log::debug!("{}", statement);
        self.0
            .executor
            .borrow_mut()
            .execute(&statement)
            .inspect_err(|e| log::error!("{:#}", e))
            .with_context(|| format!("While executing: {}", statement))
    }

    pub fn last_insert_id(&self, sequence: Option<&str>) -> Result<Value> {
        self.0.executor.borrow_mut().last_insert_id(sequence)
    }

    /// Make `E` available to relations targeting it by name.
    pub fn register<E: EntityType>(&self) -> &Self {
        let entity = EntityRef::of::<E>();
        self.0
            .entities
            .borrow_mut()
            .insert(entity.name().to_owned(), entity);
        self
    }

    /// Add a mapper kind, entity types select it with `Definition::mapper(name)`.
    pub fn register_mapper(
        &self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn MapperKind> + 'static,
    ) -> &Self {
        self.0
            .kinds
            .borrow_mut()
            .insert(name.into(), Rc::new(factory));
        self
    }

    /// The entity type a relation points to.
    pub fn resolve(&self, target: &RelationTarget) -> Result<EntityRef> {
        match target {
            RelationTarget::Type(entity) => Ok(*entity),
            RelationTarget::Named(name) => {
                self.0.entities.borrow().get(name).copied().ok_or_else(|| {
                    invalid_argument(format!(
                        "Unknown entity type `{name}`, register it on the connection first"
                    ))
                })
            }
        }
    }

    /// Cached mapping of `entity`.
    pub fn mapping_of(&self, entity: EntityRef) -> Result<Rc<Mapping>> {
        if let Some(mapping) = self.0.mappings.borrow().get(&entity.type_id()) {
            return Ok(mapping.clone());
        }
        let mapping = Rc::new(Mapping::new(entity)?);
        self.0
            .mappings
            .borrow_mut()
            .insert(entity.type_id(), mapping.clone());
        Ok(mapping)
    }

    pub fn mapping<E: EntityType>(&self) -> Result<Rc<Mapping>> {
        self.mapping_of(EntityRef::of::<E>())
    }

    /// The mapper of `E`, created on first use and reused for the connection lifetime.
    pub fn mapper<E: EntityType>(&self) -> Result<Mapper> {
        self.mapper_of(EntityRef::of::<E>())
    }

    pub fn mapper_of(&self, entity: EntityRef) -> Result<Mapper> {
        if let Some(mapper) = self.0.mappers.borrow().get(&entity.type_id()) {
            return Ok(mapper.clone());
        }
        let mapping = self.mapping_of(entity)?;
        let kind = mapping.mapper_kind().unwrap_or(DefaultMapper::NAME);
        let Some(factory) = self.0.kinds.borrow().get(kind).cloned() else {
            return Err(invalid_argument(format!(
                "Mapper kind `{kind}` of {} is not registered",
                entity.name()
            )));
        };
        let mapper = Mapper::new(self.downgrade(), mapping, factory());
        log::trace!("Created the {} mapper for {}", mapper.kind().name(), entity.name());
        self.0
            .mappers
            .borrow_mut()
            .insert(entity.type_id(), mapper.clone());
        Ok(mapper)
    }

    /// Unmapped query on `table`, the rows are read with [`Query::rows`].
    pub fn select(&self, table: &str, conditions: Conditions) -> Result<Query> {
        Query::new(self.clone(), table).where_(conditions)
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("mappers", &self.0.mappers.borrow().len())
            .finish()
    }
}
