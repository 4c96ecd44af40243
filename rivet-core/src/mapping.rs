use crate::{Condition, Conditions, FieldType, Result, Value, error::invalid_argument};
use convert_case::{Case, Casing};
use indexmap::IndexMap;
use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt::{self, Debug},
    rc::Rc,
};

/// A Rust type that can be mapped to a table.
///
/// ```rust
/// use rivet_core::{Definition, EntityType, FieldSpec};
/// struct Manufacturer;
/// impl EntityType for Manufacturer {
///     fn definition() -> Definition {
///         Definition::new("manufacturer")
///             .field("id", FieldSpec::new("integer").primary().sequence())
///             .field("name", "string")
///     }
/// }
/// ```
pub trait EntityType: 'static {
    fn definition() -> Definition;

    /// Name used to register the entity type on a connection.
    fn name() -> &'static str {
        let name = any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }
}

/// Type erased handle to an [`EntityType`].
#[derive(Clone, Copy)]
pub struct EntityRef {
    name: &'static str,
    type_id: TypeId,
    definition: fn() -> Definition,
}

impl EntityRef {
    pub fn of<E: EntityType>() -> Self {
        Self {
            name: E::name(),
            type_id: TypeId::of::<E>(),
            definition: E::definition,
        }
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
    pub fn definition(&self) -> Definition {
        (self.definition)()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Default of a field, a constant or a function evaluated for every new entity.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Function(Rc<dyn Fn() -> Value>),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Function(f) => f(),
        }
    }
}

impl Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => v.fmt(f),
            DefaultValue::Function(..) => f.write_str("<function>"),
        }
    }
}

/// Auto generation of a field value by the database.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum Sequence {
    #[default]
    None,
    /// Generated by the table itself (autoincrement, identity column).
    Auto,
    /// Generated by a named database sequence.
    Named(String),
}

impl Sequence {
    pub fn is_none(&self) -> bool {
        *self == Sequence::None
    }
    pub fn name(&self) -> Option<&str> {
        match self {
            Sequence::Named(v) => Some(v),
            _ => None,
        }
    }
}

/// Declaration of a field, built from its type tag.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    tag: String,
    default: Option<DefaultValue>,
    primary: bool,
    sequence: Sequence,
    require: bool,
    display: Option<String>,
}

impl FieldSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            default: None,
            primary: false,
            sequence: Sequence::None,
            require: false,
            display: None,
        }
    }
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
    pub fn sequence(mut self) -> Self {
        self.sequence = Sequence::Auto;
        self
    }
    pub fn sequence_named(mut self, name: impl Into<String>) -> Self {
        self.sequence = Sequence::Named(name.into());
        self
    }
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }
    pub fn default_with(mut self, function: impl Fn() -> Value + 'static) -> Self {
        self.default = Some(DefaultValue::Function(Rc::new(function)));
        self
    }
    pub fn require(mut self) -> Self {
        self.require = true;
        self
    }
    /// Human readable label of the field.
    pub fn display(mut self, label: impl Into<String>) -> Self {
        self.display = Some(label.into());
        self
    }
}

impl From<&str> for FieldSpec {
    fn from(value: &str) -> Self {
        FieldSpec::new(value)
    }
}

impl From<String> for FieldSpec {
    fn from(value: String) -> Self {
        FieldSpec::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Resolves to at most one entity.
    One,
    /// Resolves to a query over the related entities.
    Many,
}

/// Entity type a relation points to.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationTarget {
    Type(EntityRef),
    /// Looked up in the entity types registered on the connection.
    Named(String),
}

/// Declaration of a relation.
///
/// Condition values of the form `"this.<field>"` are replaced with the owner's
/// field value when the relation is resolved.
#[derive(Debug, Clone)]
pub struct RelationSpec {
    kind: RelationKind,
    target: RelationTarget,
    conditions: Conditions,
    through: Option<String>,
    field: Option<String>,
}

impl RelationSpec {
    pub fn new(kind: RelationKind, target: RelationTarget, conditions: Conditions) -> Self {
        Self {
            kind,
            target,
            conditions,
            through: None,
            field: None,
        }
    }
    pub fn one<E: EntityType>(conditions: Conditions) -> Self {
        Self::new(
            RelationKind::One,
            RelationTarget::Type(EntityRef::of::<E>()),
            conditions,
        )
    }
    pub fn many<E: EntityType>(conditions: Conditions) -> Self {
        Self::new(
            RelationKind::Many,
            RelationTarget::Type(EntityRef::of::<E>()),
            conditions,
        )
    }
    pub fn one_named(target: impl Into<String>, conditions: Conditions) -> Self {
        Self::new(
            RelationKind::One,
            RelationTarget::Named(target.into()),
            conditions,
        )
    }
    pub fn many_named(target: impl Into<String>, conditions: Conditions) -> Self {
        Self::new(
            RelationKind::Many,
            RelationTarget::Named(target.into()),
            conditions,
        )
    }
    /// Link table and the column holding the target side values, as `"table.column"`.
    pub fn through(mut self, through: impl Into<String>) -> Self {
        self.through = Some(through.into());
        self
    }
    /// Target side field matched against the link table values, `id` when unset.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Declarative description of an entity type.
#[derive(Debug, Clone)]
pub struct Definition {
    table: String,
    fields: IndexMap<String, FieldSpec>,
    relations: IndexMap<String, RelationSpec>,
    mapper: Option<String>,
}

impl Definition {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: IndexMap::new(),
            relations: IndexMap::new(),
            mapper: None,
        }
    }
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.fields.insert(name.into(), spec.into());
        self
    }
    pub fn relation(mut self, name: impl Into<String>, spec: RelationSpec) -> Self {
        self.relations.insert(name.into(), spec);
        self
    }
    /// Kind of mapper handling this entity type, registered on the connection.
    pub fn mapper(mut self, kind: impl Into<String>) -> Self {
        self.mapper = Some(kind.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub default: Option<DefaultValue>,
    pub primary: bool,
    pub sequence: Sequence,
    pub require: bool,
    pub display: Option<String>,
}

impl FieldDef {
    /// Default value of a new entity, the typed null when no default is declared.
    pub fn default_value(&self) -> Value {
        match &self.default {
            Some(default) => default.produce(),
            None => self.field_type.empty_value(),
        }
    }
    pub fn label(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
    pub target: RelationTarget,
    pub conditions: Conditions,
    /// Link `(table, column)`.
    pub through: Option<(String, String)>,
    pub field: String,
}

/// Entry of the accessor table: the method name maps to a field or relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Get(String),
    Is(String),
    Set(String),
}

/// Immutable metadata of one entity type.
#[derive(Debug)]
pub struct Mapping {
    entity: EntityRef,
    table: String,
    fields: IndexMap<String, FieldDef>,
    identifier: Vec<String>,
    sequence: Option<String>,
    relations: IndexMap<String, RelationDef>,
    mapper: Option<String>,
    accessors: HashMap<String, Accessor>,
}

impl Mapping {
    pub fn of<E: EntityType>() -> Result<Self> {
        Self::new(EntityRef::of::<E>())
    }

    pub fn new(entity: EntityRef) -> Result<Self> {
        let definition = entity.definition();
        if definition.table.is_empty() {
            return Err(invalid_argument(format!(
                "Entity type {} does not declare a table",
                entity.name()
            )));
        }
        let mut fields = IndexMap::with_capacity(definition.fields.len());
        let mut identifier = Vec::new();
        let mut sequence = None;
        for (name, spec) in definition.fields {
            let field_type = FieldType::from_tag(&spec.tag).map_err(|_| {
                invalid_argument(format!(
                    "Field `{name}` of {} has unknown type `{}`",
                    entity.name(),
                    spec.tag
                ))
            })?;
            if spec.primary {
                identifier.push(name.clone());
            }
            if !spec.sequence.is_none() {
                if let Some(previous) = sequence.replace(name.clone()) {
                    return Err(invalid_argument(format!(
                        "Entity type {} declares more than one sequence field (`{previous}` and `{name}`)",
                        entity.name()
                    )));
                }
            }
            fields.insert(
                name.clone(),
                FieldDef {
                    name,
                    field_type,
                    default: spec.default,
                    primary: spec.primary,
                    sequence: spec.sequence,
                    require: spec.require,
                    display: spec.display,
                },
            );
        }
        let mut relations = IndexMap::with_capacity(definition.relations.len());
        for (name, spec) in definition.relations {
            if fields.contains_key(&name) {
                return Err(invalid_argument(format!(
                    "Relation `{name}` of {} has the same name as a field",
                    entity.name()
                )));
            }
            check_template(&entity, &name, &fields, &spec.conditions)?;
            let through = match spec.through {
                Some(through) => match through.split_once('.') {
                    Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                        Some((table.to_owned(), column.to_owned()))
                    }
                    _ => {
                        return Err(invalid_argument(format!(
                            "Relation `{name}` of {}: `{through}` is not in the form `table.column`",
                            entity.name()
                        )));
                    }
                },
                None => None,
            };
            relations.insert(
                name.clone(),
                RelationDef {
                    name,
                    kind: spec.kind,
                    target: spec.target,
                    conditions: spec.conditions,
                    through,
                    field: spec.field.unwrap_or_else(|| "id".into()),
                },
            );
        }
        let mut accessors = HashMap::with_capacity(fields.len() * 3 + relations.len() * 2);
        for name in fields.keys() {
            let pascal = name.from_case(Case::Snake).to_case(Case::Pascal);
            accessors.insert(format!("get{pascal}"), Accessor::Get(name.clone()));
            accessors.insert(format!("is{pascal}"), Accessor::Is(name.clone()));
            accessors.insert(format!("set{pascal}"), Accessor::Set(name.clone()));
        }
        for name in relations.keys() {
            let pascal = name.from_case(Case::Snake).to_case(Case::Pascal);
            accessors.insert(format!("get{pascal}"), Accessor::Get(name.clone()));
            accessors.insert(format!("is{pascal}"), Accessor::Is(name.clone()));
        }
        Ok(Self {
            entity,
            table: definition.table,
            fields,
            identifier,
            sequence,
            relations,
            mapper: definition.mapper,
            accessors,
        })
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn fields(&self) -> &IndexMap<String, FieldDef> {
        &self.fields
    }
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }
    /// Primary fields, in declaration order.
    pub fn identifier(&self) -> &[String] {
        &self.identifier
    }
    /// The auto generated field, if any.
    pub fn sequence(&self) -> Option<&FieldDef> {
        self.sequence.as_ref().and_then(|v| self.fields.get(v))
    }
    /// Name of the database sequence feeding the sequence field, if it is a named one.
    pub fn sequence_name(&self) -> Option<&str> {
        self.sequence().and_then(|v| v.sequence.name())
    }
    pub fn relations(&self) -> &IndexMap<String, RelationDef> {
        &self.relations
    }
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }
    pub fn mapper_kind(&self) -> Option<&str> {
        self.mapper.as_deref()
    }
    pub fn accessor(&self, method: &str) -> Option<&Accessor> {
        self.accessors.get(method)
    }
}

/// Every `this.<field>` value must name a declared field.
fn check_template(
    entity: &EntityRef,
    relation: &str,
    fields: &IndexMap<String, FieldDef>,
    conditions: &Conditions,
) -> Result<()> {
    for (_, condition) in conditions.iter() {
        match condition {
            Condition::Group(group) => check_template(entity, relation, fields, group)?,
            Condition::Value(value) => {
                if let Some(field) = template_field(value) {
                    if !fields.contains_key(field) {
                        return Err(invalid_argument(format!(
                            "Relation `{relation}` of {} references the undeclared field `{field}`",
                            entity.name()
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

/// The owner field referenced by a `"this.<field>"` template value.
pub fn template_field(value: &Value) -> Option<&str> {
    value
        .as_str()
        .and_then(|v| v.strip_prefix("this."))
        .filter(|v| !v.is_empty())
}
