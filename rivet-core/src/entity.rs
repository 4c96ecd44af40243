use crate::{
    Accessor, AsValue, IdentityKey, Mapping, Query, RelationKind, Result, Value,
    error::invalid_argument, error::method_not_found,
};
use indexmap::IndexMap;
use std::{
    cell::RefCell,
    fmt::{self, Debug},
    ops::{BitAnd, BitOr, Not},
    rc::Rc,
};

/// Field values by name, in insertion order.
pub type Data = IndexMap<String, Value>;

/// Lifecycle flags of an [`Entity`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Not persisted yet.
    pub const NEW: Flags = Flags(1);
    /// Written since it was last persisted or loaded.
    pub const DIRTY: Flags = Flags(1 << 1);

    pub fn bits(&self) -> u8 {
        self.0
    }
    pub fn contains(&self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Self) -> Self::Output {
        Flags(self.0 | rhs.0)
    }
}

impl BitAnd for Flags {
    type Output = Flags;
    fn bitand(self, rhs: Self) -> Self::Output {
        Flags(self.0 & rhs.0)
    }
}

impl Not for Flags {
    type Output = Flags;
    fn not(self) -> Self::Output {
        Flags(!self.0)
    }
}

/// Evaluates a relation for the entity owning it.
pub type Resolver = Rc<dyn Fn(&Entity) -> Result<Related>>;

/// Content of an entity data entry.
#[derive(Clone)]
pub enum Slot {
    Value(Value),
    /// Relation evaluated on every read.
    Lazy(Resolver),
    /// Relation explicitly assigned.
    Resolved(Related),
}

impl Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Value(v) => v.fmt(f),
            Slot::Lazy(..) => f.write_str("<lazy>"),
            Slot::Resolved(v) => v.fmt(f),
        }
    }
}

/// The result of reading a relation.
#[derive(Debug, Clone)]
pub enum Related {
    One(Option<Entity>),
    Many(Query),
}

impl Related {
    pub fn one(self) -> Option<Entity> {
        match self {
            Related::One(v) => v,
            Related::Many(..) => None,
        }
    }
    pub fn many(self) -> Option<Query> {
        match self {
            Related::Many(v) => Some(v),
            Related::One(..) => None,
        }
    }
}

/// Returned by [`Entity::call`].
#[derive(Debug)]
pub enum Output {
    Value(Value),
    Related(Related),
    Unit,
}

impl Output {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Output::Value(v) => Some(v),
            _ => None,
        }
    }
    pub fn into_related(self) -> Option<Related> {
        match self {
            Output::Related(v) => Some(v),
            _ => None,
        }
    }
}

struct EntityState {
    mapping: Rc<Mapping>,
    data: IndexMap<String, Slot>,
    flags: Flags,
    /// Key of the identity map entry pointing to this entity.
    tracked: Option<IdentityKey>,
}

/// Mutable bag of field values of a mapped type.
///
/// Cloning an entity clones the handle: every clone observes the same state,
/// the identity map relies on this to hand out one instance per row.
#[derive(Clone)]
pub struct Entity(Rc<RefCell<EntityState>>);

impl Entity {
    pub(crate) fn new(mapping: Rc<Mapping>, data: IndexMap<String, Slot>, flags: Flags) -> Self {
        Self(Rc::new(RefCell::new(EntityState {
            mapping,
            data,
            flags,
            tracked: None,
        })))
    }

    pub fn mapping(&self) -> Rc<Mapping> {
        self.0.borrow().mapping.clone()
    }

    /// Snapshot of the field values, relations are omitted.
    pub fn data(&self) -> Data {
        self.0
            .borrow()
            .data
            .iter()
            .filter_map(|(k, v)| match v {
                Slot::Value(v) => Some((k.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    /// Value of a declared field.
    pub fn value(&self, field: &str) -> Result<Value> {
        let state = self.0.borrow();
        let Some(def) = state.mapping.field(field) else {
            return Err(self.undeclared(&state.mapping, field));
        };
        Ok(match state.data.get(field) {
            Some(Slot::Value(v)) => v.clone(),
            _ => def.field_type.empty_value(),
        })
    }

    /// Value of a declared field converted to `T`.
    pub fn get<T: AsValue>(&self, field: &str) -> Result<T> {
        T::try_from_value(self.value(field)?)
    }

    /// Write a declared field through its codec and mark the entity dirty.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let mut state = self.0.borrow_mut();
        let Some(def) = state.mapping.field(field) else {
            return Err(self.undeclared(&state.mapping, field));
        };
        let value = def.field_type.to_native(value.into())?;
        state.data.insert(field.to_owned(), Slot::Value(value));
        state.flags = state.flags | Flags::DIRTY;
        Ok(())
    }

    /// Replace the lazy relation `name` with an explicit value and mark the entity dirty.
    pub fn set_related(&self, name: &str, related: Related) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.mapping.relation(name).is_none() {
            return Err(invalid_argument(format!(
                "{} does not declare the relation `{name}`",
                state.mapping.entity().name()
            )));
        }
        state.data.insert(name.to_owned(), Slot::Resolved(related));
        state.flags = state.flags | Flags::DIRTY;
        Ok(())
    }

    /// Evaluate the relation `name`, the result is never cached.
    pub fn related(&self, name: &str) -> Result<Related> {
        let slot = {
            let state = self.0.borrow();
            if state.mapping.relation(name).is_none() {
                return Err(invalid_argument(format!(
                    "{} does not declare the relation `{name}`",
                    state.mapping.entity().name()
                )));
            }
            state.data.get(name).cloned()
        };
        match slot {
            Some(Slot::Lazy(resolver)) => resolver(self),
            Some(Slot::Resolved(related)) => Ok(related),
            _ => Err(invalid_argument(format!(
                "The relation `{name}` is not bound to a mapper"
            ))),
        }
    }

    /// Dynamic accessor dispatch: `get<Field>`, `is<Field>` and `set<Field>(value)`.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Output> {
        let mapping = self.mapping();
        let Some(accessor) = mapping.accessor(method) else {
            return Err(method_not_found(mapping.entity().name(), method));
        };
        match accessor {
            Accessor::Get(name) if mapping.relation(name).is_some() => {
                Ok(Output::Related(self.related(name)?))
            }
            Accessor::Get(name) => Ok(Output::Value(self.value(name)?)),
            Accessor::Is(name) => {
                let truthy = match mapping.relation(name).map(|v| v.kind) {
                    Some(RelationKind::One) => self.related(name)?.one().is_some(),
                    Some(RelationKind::Many) => match self.related(name)?.many() {
                        Some(query) => query.count(false)? > 0,
                        None => false,
                    },
                    None => self.value(name)?.is_truthy(),
                };
                Ok(Output::Value(Value::Boolean(Some(truthy))))
            }
            Accessor::Set(name) => {
                let Some(value) = args.first() else {
                    return Err(invalid_argument(format!(
                        "Missing argument 1 for {}::{method}",
                        mapping.entity().name()
                    )));
                };
                self.set(name, value.clone())?;
                Ok(Output::Unit)
            }
        }
    }

    pub fn flags(&self) -> Flags {
        self.0.borrow().flags
    }
    pub fn flag(&self, flags: Flags) {
        let mut state = self.0.borrow_mut();
        state.flags = state.flags | flags;
    }
    pub fn unflag(&self, flags: Flags) {
        let mut state = self.0.borrow_mut();
        state.flags = state.flags & !flags;
    }
    pub fn flagged(&self, flags: Flags) -> bool {
        self.0.borrow().flags.contains(flags)
    }
    pub fn is_new(&self) -> bool {
        self.flagged(Flags::NEW)
    }
    pub fn is_dirty(&self) -> bool {
        self.flagged(Flags::DIRTY)
    }

    /// Whether both handles point to the same instance.
    pub fn same(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn tracked_key(&self) -> Option<IdentityKey> {
        self.0.borrow().tracked.clone()
    }

    pub(crate) fn set_tracked_key(&self, key: Option<IdentityKey>) {
        self.0.borrow_mut().tracked = key;
    }

    /// Write without touching the flags.
    pub(crate) fn write(&self, field: &str, value: Value) {
        self.0
            .borrow_mut()
            .data
            .insert(field.to_owned(), Slot::Value(value));
    }

    fn undeclared(&self, mapping: &Mapping, field: &str) -> crate::Error {
        if mapping.relation(field).is_some() {
            invalid_argument(format!(
                "`{field}` is a relation of {}, read it with `related`",
                mapping.entity().name()
            ))
        } else {
            invalid_argument(format!(
                "{} does not declare the field `{field}`",
                mapping.entity().name()
            ))
        }
    }
}

impl Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct(state.mapping.entity().name())
            .field("data", &state.data)
            .field("flags", &state.flags)
            .finish()
    }
}
