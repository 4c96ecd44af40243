use crate::{
    ClauseContext, Collection, Condition, Conditions, Connection, Data, Entity, ErrorKind,
    Flags, Glue, IdentityKey, Mapping, OperatorRegistry, Query, Related, RelationKind, Resolver,
    Result, RowLabeled, Slot, Statement, Value, compile, connection::ConnectionInner,
    error::invalid_argument, template_field,
};
use indexmap::IndexMap;
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    fmt::{self, Debug},
    rc::{Rc, Weak},
};

/// Capability hooks of a mapper, selected per entity type by name.
///
/// The connection knows the `default` kind, others are added with
/// [`Connection::register_mapper`] and picked by [`Definition::mapper`](crate::Definition::mapper).
pub trait MapperKind {
    fn name(&self) -> &str;

    /// Called before the row is written, the entity can still be changed.
    fn before_insert(&self, _mapper: &Mapper, _entity: &Entity) -> Result<()> {
        Ok(())
    }
    fn before_update(&self, _mapper: &Mapper, _entity: &Entity) -> Result<()> {
        Ok(())
    }
    /// Called once per entity materialized from a row.
    fn after_load(&self, _mapper: &Mapper, _entity: &Entity) -> Result<()> {
        Ok(())
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct DefaultMapper;

impl DefaultMapper {
    pub const NAME: &'static str = "default";
}

impl MapperKind for DefaultMapper {
    fn name(&self) -> &str {
        Self::NAME
    }
}

pub(crate) struct MapperInner {
    connection: Weak<ConnectionInner>,
    mapping: Rc<Mapping>,
    identity: RefCell<HashMap<IdentityKey, Entity>>,
    kind: Box<dyn MapperKind>,
}

/// Persistence of one entity type: construction, writes, lookups and relations.
///
/// Entities loaded or inserted through a mapper are tracked in its identity
/// map, so the same row always yields the same [`Entity`] instance.
#[derive(Clone)]
pub struct Mapper(Rc<MapperInner>);

impl Mapper {
    pub(crate) fn new(
        connection: Weak<ConnectionInner>,
        mapping: Rc<Mapping>,
        kind: Box<dyn MapperKind>,
    ) -> Self {
        Self(Rc::new(MapperInner {
            connection,
            mapping,
            identity: RefCell::new(HashMap::new()),
            kind,
        }))
    }

    pub fn mapping(&self) -> &Rc<Mapping> {
        &self.0.mapping
    }

    pub fn kind(&self) -> &dyn MapperKind {
        self.0.kind.as_ref()
    }

    pub fn connection(&self) -> Result<Connection> {
        Connection::from_weak(&self.0.connection)
    }

    /// Number of entities tracked by the identity map.
    pub fn tracked(&self) -> usize {
        self.0.identity.borrow().len()
    }

    /// New entity flagged NEW, missing fields take their default. No I/O.
    pub fn entity(&self, mut data: Data) -> Result<Entity> {
        let mapping = &self.0.mapping;
        let mut slots = IndexMap::with_capacity(mapping.fields().len() + mapping.relations().len());
        for (name, field) in mapping.fields() {
            let value = match data.shift_remove(name) {
                Some(v) if !v.is_null() => v,
                _ => field.default_value(),
            };
            slots.insert(name.clone(), Slot::Value(field.field_type.to_native(value)?));
        }
        for name in data.keys() {
            log::warn!(
                "Ignoring `{name}`, it is not a field of {}",
                mapping.entity().name()
            );
        }
        self.bind_relations(&mut slots);
        Ok(Entity::new(mapping.clone(), slots, Flags::NEW))
    }

    fn bind_relations(&self, slots: &mut IndexMap<String, Slot>) {
        for name in self.0.mapping.relations().keys() {
            let mapper = Rc::downgrade(&self.0);
            let relation = name.clone();
            let resolver: Resolver = Rc::new(move |entity: &Entity| {
                let Some(mapper) = mapper.upgrade() else {
                    return Err(invalid_argument(format!(
                        "The mapper resolving `{relation}` was dropped"
                    )));
                };
                Mapper(mapper).relation(entity, &relation)
            });
            slots.insert(name.clone(), Slot::Lazy(resolver));
        }
    }

    /// [`Mapper::entity`] then [`Mapper::insert`].
    pub fn create(&self, data: Data) -> Result<Entity> {
        let entity = self.entity(data)?;
        self.insert(&entity)?;
        Ok(entity)
    }

    pub fn insert(&self, entity: &Entity) -> Result<()> {
        self.0.kind.before_insert(self, entity)?;
        self.validate(entity)?;
        let mapping = &self.0.mapping;
        let mut data = self.flatten(entity)?;
        let sequence = mapping
            .sequence()
            .filter(|v| data.get(&v.name).is_none_or(Value::is_null))
            .map(|v| {
                data.shift_remove(&v.name);
                v
            });
        let columns = data.keys().map(String::as_str).collect::<Vec<_>>();
        let mut sql = String::new();
        let connection = self.connection()?;
        connection
            .sql_writer()
            .write_insert(&mut sql, mapping.table(), &columns);
        connection.execute(Statement::new(sql, data.into_values().collect()))?;
        if let Some(sequence) = sequence {
            let id = connection.last_insert_id(mapping.sequence_name())?;
            entity.write(&sequence.name, sequence.field_type.to_native(id)?);
        }
        entity.unflag(Flags::NEW | Flags::DIRTY);
        self.track(entity);
        Ok(())
    }

    /// Write the fields of a DIRTY entity, clean entities are left alone.
    pub fn update(&self, entity: &Entity) -> Result<()> {
        if !entity.flagged(Flags::DIRTY) {
            return Ok(());
        }
        self.0.kind.before_update(self, entity)?;
        self.validate(entity)?;
        let mapping = &self.0.mapping;
        let mut data = self.flatten(entity)?;
        let mut identifier = Conditions::new();
        for name in mapping.identifier() {
            if let Some(value) = data.shift_remove(name) {
                identifier.push(name.clone(), value);
            }
        }
        let connection = self.connection()?;
        let (predicate, parameters) = self.identifier_predicate(&connection, &identifier)?;
        if !data.is_empty() {
            let columns = data.keys().map(String::as_str).collect::<Vec<_>>();
            let mut sql = String::new();
            connection
                .sql_writer()
                .write_update(&mut sql, mapping.table(), &columns, &predicate);
            connection.execute(Statement::new(
                sql,
                data.into_values().chain(parameters).collect(),
            ))?;
        }
        entity.unflag(Flags::DIRTY);
        self.track(entity);
        Ok(())
    }

    /// Insert NEW entities, update the others.
    pub fn save(&self, entity: &Entity) -> Result<()> {
        if entity.flagged(Flags::NEW) {
            self.insert(entity)
        } else {
            self.update(entity)
        }
    }

    /// Load the first match of `conditions` or build a new entity, merge `data` into it and save.
    pub fn upsert(&self, data: Data, conditions: Conditions) -> Result<Entity> {
        let entity = match self.first(conditions)? {
            Some(entity) => {
                for (name, value) in data {
                    entity.set(&name, value)?;
                }
                entity
            }
            None => self.entity(data)?,
        };
        self.save(&entity)?;
        Ok(entity)
    }

    /// Delete the row, then clear the identifier and sequence fields and flag the entity NEW again.
    pub fn delete(&self, entity: &Entity) -> Result<()> {
        let mapping = &self.0.mapping;
        let data = self.flatten(entity)?;
        let identifier = mapping
            .identifier()
            .iter()
            .filter_map(|name| Some((name.clone(), data.get(name)?.clone())))
            .collect::<Conditions>();
        let connection = self.connection()?;
        let (predicate, parameters) = self.identifier_predicate(&connection, &identifier)?;
        let mut sql = String::new();
        connection
            .sql_writer()
            .write_delete(&mut sql, mapping.table(), &predicate);
        connection.execute(Statement::new(sql, parameters))?;
        self.untrack(entity);
        for field in mapping.fields().values() {
            if field.primary || !field.sequence.is_none() {
                entity.write(&field.name, field.field_type.empty_value());
            }
        }
        entity.flag(Flags::NEW);
        Ok(())
    }

    /// Query on the table of this mapper.
    pub fn find(&self, conditions: Conditions) -> Result<Query> {
        Ok(self
            .connection()?
            .select(self.0.mapping.table(), conditions)?
            .with_mapper(self.clone()))
    }

    /// First match of `conditions`, served from the identity map when they
    /// are exactly equalities on the whole identifier.
    pub fn first(&self, conditions: Conditions) -> Result<Option<Entity>> {
        if let Some(key) = self.lookup_key(&conditions) {
            if let Some(entity) = self.0.identity.borrow().get(&key) {
                log::trace!("{} {{{key}}} found in the identity map", self.0.mapping.entity().name());
                return Ok(Some(entity.clone()));
            }
        }
        self.find(conditions)?.first()
    }

    fn lookup_key(&self, conditions: &Conditions) -> Option<IdentityKey> {
        let identifier = self.0.mapping.identifier();
        let equalities = conditions.as_equalities()?;
        if equalities.len() != identifier.len()
            || !identifier
                .iter()
                .all(|name| equalities.iter().any(|(field, _)| field == name))
        {
            return None;
        }
        IdentityKey::new(equalities)
    }

    /// Entities of `rows`: tracked instances are reused, the other rows are
    /// expanded into fresh entities, neither NEW nor DIRTY.
    pub fn collection(&self, rows: &[RowLabeled]) -> Result<Collection> {
        let mapping = &self.0.mapping;
        let mut ignored = BTreeSet::new();
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Data::with_capacity(row.values.len());
            for (name, value) in row.iter() {
                match mapping.field(name) {
                    Some(field) => {
                        values.insert(name.to_owned(), field.field_type.to_native(value.clone())?);
                    }
                    None => {
                        ignored.insert(name);
                    }
                }
            }
            let key = IdentityKey::new(
                mapping
                    .identifier()
                    .iter()
                    .filter_map(|name| Some((name.as_str(), values.get(name)?))),
            )
            .filter(|_| {
                mapping
                    .identifier()
                    .iter()
                    .all(|name| values.contains_key(name))
            });
            if let Some(entity) = key
                .as_ref()
                .and_then(|key| self.0.identity.borrow().get(key).cloned())
            {
                entities.push(entity);
                continue;
            }
            let entity = self.expand(values);
            self.0.kind.after_load(self, &entity)?;
            if let Some(key) = key {
                entity.set_tracked_key(Some(key.clone()));
                self.0.identity.borrow_mut().insert(key, entity.clone());
            }
            entities.push(entity);
        }
        if !ignored.is_empty() {
            log::warn!(
                "Ignoring columns {:?} of `{}`, they are not fields of {}",
                ignored,
                mapping.table(),
                mapping.entity().name()
            );
        }
        Ok(Collection::new(entities))
    }

    fn expand(&self, mut values: Data) -> Entity {
        let mapping = &self.0.mapping;
        let mut slots = IndexMap::with_capacity(mapping.fields().len() + mapping.relations().len());
        for (name, field) in mapping.fields() {
            let value = values
                .shift_remove(name)
                .unwrap_or_else(|| field.field_type.empty_value());
            slots.insert(name.clone(), Slot::Value(value));
        }
        self.bind_relations(&mut slots);
        Entity::new(mapping.clone(), slots, Flags::NONE)
    }

    /// Resolve the relation `name` of `entity` with its current field values.
    pub fn relation(&self, entity: &Entity, name: &str) -> Result<Related> {
        let mapping = &self.0.mapping;
        let Some(relation) = mapping.relation(name) else {
            return Err(invalid_argument(format!(
                "{} does not declare the relation `{name}`",
                mapping.entity().name()
            )));
        };
        let connection = self.connection()?;
        let target = connection.resolve(&relation.target)?;
        let mut conditions = substitute(&relation.conditions, entity)?;
        if let Some((table, column)) = &relation.through {
            let mut linked = Vec::new();
            for row in connection.select(table, conditions)?.rows()? {
                let Some(value) = row.get_column(column) else {
                    return Err(invalid_argument(format!(
                        "The link table `{table}` of relation `{name}` has no column `{column}`"
                    )));
                };
                if !value.is_null() && !linked.contains(value) {
                    linked.push(value.clone());
                }
            }
            conditions = Conditions::new();
            conditions.push(relation.field.clone(), Value::List(Some(linked)));
        }
        let mapper = connection.mapper_of(target)?;
        Ok(match relation.kind {
            RelationKind::One => Related::One(mapper.first(conditions)?),
            RelationKind::Many => Related::Many(mapper.find(conditions)?),
        })
    }

    fn validate(&self, entity: &Entity) -> Result<()> {
        let mapping = &self.0.mapping;
        for field in mapping.fields().values().filter(|v| v.require) {
            if entity.value(&field.name)?.is_null() {
                let error = crate::Error::new(ErrorKind::Validation {
                    entity: mapping.entity().name().into(),
                    field: field.label().into(),
                });
                log::debug!("{:#}", error);
                return Err(error);
            }
        }
        Ok(())
    }

    /// Field values encoded for the database.
    fn flatten(&self, entity: &Entity) -> Result<Data> {
        let mut data = entity.data();
        for (name, field) in self.0.mapping.fields() {
            if let Some(value) = data.get_mut(name) {
                *value = field.field_type.to_storage(std::mem::take(value))?;
            }
        }
        Ok(data)
    }

    fn identifier_predicate(
        &self,
        connection: &Connection,
        identifier: &Conditions,
    ) -> Result<(String, Vec<Value>)> {
        let incomplete = identifier.len() != self.0.mapping.identifier().len()
            || identifier
                .iter()
                .any(|(_, v)| matches!(v, Condition::Value(v) if v.is_null()));
        if identifier.is_empty() || incomplete {
            return Err(invalid_argument(format!(
                "Cannot persist {} without its identifier",
                self.0.mapping.entity().name()
            )));
        }
        let mut context = ClauseContext::new(connection.sql_writer());
        let predicate = compile(identifier, Glue::And, OperatorRegistry::global(), &mut context)?;
        Ok((predicate, context.into_parameters()))
    }

    fn identity_key(&self, entity: &Entity) -> Option<IdentityKey> {
        let values = self
            .0
            .mapping
            .identifier()
            .iter()
            .map(|name| Some((name.as_str(), entity.value(name).ok()?)))
            .collect::<Option<Vec<_>>>()?;
        IdentityKey::new(values.iter().map(|(k, v)| (*k, v)))
    }

    /// Register `entity` under its current identifier, replacing the entry
    /// of the identifier it was tracked with before.
    fn track(&self, entity: &Entity) {
        let key = self.identity_key(entity);
        self.untrack(entity);
        if let Some(key) = &key {
            self.0
                .identity
                .borrow_mut()
                .insert(key.clone(), entity.clone());
        }
        entity.set_tracked_key(key);
    }

    fn untrack(&self, entity: &Entity) {
        if let Some(key) = entity.tracked_key() {
            let mut identity = self.0.identity.borrow_mut();
            if identity.get(&key).is_some_and(|v| v.same(entity)) {
                identity.remove(&key);
            }
        }
        entity.set_tracked_key(None);
    }
}

impl Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("entity", self.0.mapping.entity())
            .field("kind", &self.0.kind.name())
            .field("tracked", &self.tracked())
            .finish()
    }
}

/// Replace the `"this.<field>"` values with the fields of `entity`.
fn substitute(conditions: &Conditions, entity: &Entity) -> Result<Conditions> {
    let mut result = Conditions::new();
    for (key, condition) in conditions.iter() {
        match condition {
            Condition::Group(group) => {
                result.push(key, substitute(group, entity)?);
            }
            Condition::Value(value) => match template_field(value) {
                Some(field) => {
                    result.push(key, entity.value(field)?);
                }
                None => {
                    result.push(key, value.clone());
                }
            },
        }
    }
    Ok(result)
}
