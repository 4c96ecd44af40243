use crate::{
    Context, Data, OperatorRegistry, Result, SqlWriter, Value, error::invalid_argument,
    separated_by,
};

/// Value side of a condition entry: a value to compare with, or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Value(Value),
    Group(Conditions),
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Condition::Value(value)
    }
}

impl From<Conditions> for Condition {
    fn from(value: Conditions) -> Self {
        Condition::Group(value)
    }
}

/// Ordered condition map.
///
/// Keys are `"field"` or `"field operator"` (the operator defaults to `eq`),
/// or `and` / `or` introducing a nested [`Condition::Group`].
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Conditions(Vec<(String, Condition)>);

impl Conditions {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn push(&mut self, key: impl Into<String>, condition: impl Into<Condition>) -> &mut Self {
        self.0.push((key.into(), condition.into()));
        self
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Condition)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
    /// The plain field equalities of this map, `None` if there is anything else.
    pub fn as_equalities(&self) -> Option<Vec<(&str, &Value)>> {
        self.0
            .iter()
            .map(|(key, condition)| match (split_key(key), condition) {
                ((field, None), Condition::Value(value))
                    if Glue::from_key(field).is_none() && !matches!(value, Value::List(..)) =>
                {
                    Some((field, value))
                }
                _ => None,
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Condition>> FromIterator<(K, V)> for Conditions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Data> for Conditions {
    fn from(value: Data) -> Self {
        value.into_iter().collect()
    }
}

impl IntoIterator for Conditions {
    type Item = (String, Condition);
    type IntoIter = std::vec::IntoIter<(String, Condition)>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Boolean connective joining the entries of a condition map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glue {
    And,
    Or,
}

impl Glue {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Glue::And => " AND ",
            Glue::Or => " OR ",
        }
    }
    pub fn from_key(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case("and") {
            Some(Glue::And)
        } else if key.eq_ignore_ascii_case("or") {
            Some(Glue::Or)
        } else {
            None
        }
    }
}

/// Split `"field operator"` into its two parts.
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    let key = key.trim();
    match key.split_once(char::is_whitespace) {
        Some((field, operator)) => (field, Some(operator.trim())),
        None => (key, None),
    }
}

/// State shared by the operators while a clause is compiled: the SQL
/// dialect and the parameters bound so far.
pub struct ClauseContext<'a> {
    writer: &'a dyn SqlWriter,
    context: Context,
    parameters: Vec<Value>,
}

impl<'a> ClauseContext<'a> {
    pub fn new(writer: &'a dyn SqlWriter) -> Self {
        Self {
            writer,
            context: Context::new(true),
            parameters: Vec::new(),
        }
    }

    /// Bind `value` and return its placeholder.
    pub fn parameter(&mut self, value: Value) -> String {
        let mut out = String::with_capacity(2);
        self.writer.write_placeholder(&mut self.context, &mut out);
        self.parameters.push(value);
        out
    }

    /// Bind every element of `values`, returning the comma separated placeholders.
    pub fn parameter_list(&mut self, values: Vec<Value>) -> String {
        let mut out = String::with_capacity(values.len() * 3);
        separated_by(
            &mut out,
            values,
            |out, v| out.push_str(&self.parameter(v)),
            ", ",
        );
        out
    }

    /// Quoted column reference.
    pub fn column(&mut self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.writer.write_column_ref(&mut self.context, &mut out, name);
        out
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<Value> {
        self.parameters
    }
}

/// Compile `conditions` into a SQL predicate whose top level entries are joined by `glue`.
///
/// Nested groups are compiled with their own connective and parenthesized.
/// An empty map compiles to an empty string.
pub fn compile(
    conditions: &Conditions,
    glue: Glue,
    registry: &OperatorRegistry,
    context: &mut ClauseContext,
) -> Result<String> {
    let mut out = String::new();
    let mut result = Ok(());
    separated_by(
        &mut out,
        conditions.iter(),
        |out, (key, condition)| {
            if result.is_err() {
                return;
            }
            match compile_entry(key, condition, registry, context) {
                Ok(fragment) => out.push_str(&fragment),
                Err(e) => result = Err(e),
            }
        },
        glue.as_sql(),
    );
    result?;
    Ok(out)
}

fn compile_entry(
    key: &str,
    condition: &Condition,
    registry: &OperatorRegistry,
    context: &mut ClauseContext,
) -> Result<String> {
    if let Some(glue) = Glue::from_key(key.trim()) {
        let Condition::Group(group) = condition else {
            return Err(invalid_argument(format!(
                "The `{key}` condition expects a nested group of conditions"
            )));
        };
        let compiled = compile(group, glue, registry, context)?;
        return Ok(if compiled.is_empty() {
            compiled
        } else {
            format!("({compiled})")
        });
    }
    let (field, alias) = split_key(key);
    if field.is_empty() {
        return Err(invalid_argument("Empty field name in condition"));
    }
    let alias = alias.unwrap_or("eq");
    let Some(operator) = registry.get(alias) else {
        return Err(invalid_argument(format!(
            "Unknown operator `{alias}` in condition `{key}`"
        )));
    };
    let Condition::Value(value) = condition else {
        return Err(invalid_argument(format!(
            "The condition `{key}` expects a value, not a group"
        )));
    };
    let column = context.column(field);
    Ok(operator.render(context, &column, value.clone()))
}

#[cfg(test)]
mod tests {
    use super::{ClauseContext, Glue, compile, split_key};
    use crate::{ErrorKind, GenericSqlWriter, OperatorRegistry, Value, conditions};

    #[test]
    fn splits_operator_from_field() {
        assert_eq!(split_key("name"), ("name", None));
        assert_eq!(split_key("founding_year  >= "), ("founding_year", Some(">=")));
    }

    #[test]
    fn nested_groups_are_parenthesized() {
        let writer = GenericSqlWriter::new();
        let mut context = ClauseContext::new(&writer);
        let sql = compile(
            &conditions! {
                "or" => {
                    "and" => { "manufacturer_id" => 1, "name like" => "A%" },
                    "manufacturer_id" => 2,
                },
            },
            Glue::And,
            OperatorRegistry::global(),
            &mut context,
        )
        .unwrap();
        assert_eq!(
            sql,
            r#"(("manufacturer_id" = ? AND "name" LIKE ?) OR "manufacturer_id" = ?)"#
        );
        assert_eq!(
            context.parameters(),
            &[
                Value::Int32(Some(1)),
                Value::Varchar(Some("A%".into())),
                Value::Int32(Some(2))
            ]
        );
    }

    #[test]
    fn unknown_operator_is_invalid() {
        let writer = GenericSqlWriter::new();
        let mut context = ClauseContext::new(&writer);
        let error = compile(
            &conditions! { "name between" => "A" },
            Glue::And,
            OperatorRegistry::global(),
            &mut context,
        )
        .unwrap_err();
        assert!(matches!(
            ErrorKind::of(&error),
            Some(ErrorKind::InvalidArgument(..))
        ));
    }

    #[test]
    fn equalities() {
        let conditions = conditions! { "id" => 1, "name" => "BMW" };
        assert_eq!(conditions.as_equalities().map(|v| v.len()), Some(2));
        let conditions = conditions! { "id >" => 1 };
        assert_eq!(conditions.as_equalities(), None);
        let conditions = conditions! { "id" => vec![1, 2] };
        assert_eq!(conditions.as_equalities(), None);
    }
}
