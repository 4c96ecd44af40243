use crate::{ClauseContext, Result, Value, error::invalid_argument};
use std::{
    collections::HashMap,
    fmt::{self, Debug},
    sync::{Arc, OnceLock},
};

/// Comparison predicate rendering a column/value pair into a SQL fragment.
///
/// Implementations bind their values through the [`ClauseContext`] and return
/// SQL containing only the placeholders.
pub trait Operator: Send + Sync {
    fn name(&self) -> &'static str;
    fn render(&self, context: &mut ClauseContext, column: &str, value: Value) -> String;
}

/// `=`, `IN (...)` for non-empty lists, `IS NULL` for null and empty lists.
#[derive(Default, Debug, Clone, Copy)]
pub struct Equals;

impl Operator for Equals {
    fn name(&self) -> &'static str {
        "Equals"
    }
    fn render(&self, context: &mut ClauseContext, column: &str, value: Value) -> String {
        match value {
            Value::List(Some(values)) if !values.is_empty() => {
                format!("{column} IN ({})", context.parameter_list(values))
            }
            Value::List(..) => format!("{column} IS NULL"),
            v if v.is_null() => format!("{column} IS NULL"),
            v => format!("{column} = {}", context.parameter(v)),
        }
    }
}

/// Negation of [`Equals`]: `!=`, `NOT IN (...)`, `IS NOT NULL`.
#[derive(Default, Debug, Clone, Copy)]
pub struct Not;

impl Operator for Not {
    fn name(&self) -> &'static str {
        "Not"
    }
    fn render(&self, context: &mut ClauseContext, column: &str, value: Value) -> String {
        match value {
            Value::List(Some(values)) if !values.is_empty() => {
                format!("{column} NOT IN ({})", context.parameter_list(values))
            }
            Value::List(..) => format!("{column} IS NOT NULL"),
            v if v.is_null() => format!("{column} IS NOT NULL"),
            v => format!("{column} != {}", context.parameter(v)),
        }
    }
}

macro_rules! comparison_operator {
    ($name:ident, $sql:literal) => {
        #[doc = concat!("`column ", $sql, " ?`")]
        #[derive(Default, Debug, Clone, Copy)]
        pub struct $name;

        impl Operator for $name {
            fn name(&self) -> &'static str {
                stringify!($name)
            }
            fn render(&self, context: &mut ClauseContext, column: &str, value: Value) -> String {
                format!(concat!("{} ", $sql, " {}"), column, context.parameter(value))
            }
        }
    };
}
comparison_operator!(GreaterThan, ">");
comparison_operator!(GreaterThanOrEquals, ">=");
comparison_operator!(LessThan, "<");
comparison_operator!(LessThanOrEquals, "<=");
comparison_operator!(Like, "LIKE");

static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

/// Alias to operator table used by the clause compiler.
///
/// The process wide instance is created on first use with the builtin
/// aliases, unless a customized one was installed before.
/// ```rust
/// use rivet_core::OperatorRegistry;
/// let registry = OperatorRegistry::global();
/// assert_eq!(registry.get(">=").map(|v| v.name()), Some("GreaterThanOrEquals"));
/// ```
#[derive(Clone)]
pub struct OperatorRegistry {
    operators: HashMap<String, Arc<dyn Operator>>,
}

impl OperatorRegistry {
    /// Builder preloaded with the builtin aliases.
    pub fn builder() -> OperatorRegistryBuilder {
        let mut operators = HashMap::new();
        let mut add = |aliases: &[&str], operator: Arc<dyn Operator>| {
            for alias in aliases {
                operators.insert(alias.to_lowercase(), operator.clone());
            }
        };
        add(&["eq", "equals", "="], Arc::new(Equals));
        add(&["not", "!="], Arc::new(Not));
        add(&["gt", "greaterThan", ">"], Arc::new(GreaterThan));
        add(&["gte", "greaterThanOrEquals", ">="], Arc::new(GreaterThanOrEquals));
        add(&["lt", "lessThan", "<"], Arc::new(LessThan));
        add(&["lte", "lessThanOrEquals", "<="], Arc::new(LessThanOrEquals));
        add(&["like"], Arc::new(Like));
        OperatorRegistryBuilder {
            registry: OperatorRegistry { operators },
        }
    }

    /// The process wide registry.
    pub fn global() -> &'static OperatorRegistry {
        REGISTRY.get_or_init(|| Self::builder().build())
    }

    /// Case insensitive alias lookup.
    pub fn get(&self, alias: &str) -> Option<&Arc<dyn Operator>> {
        self.operators.get(&alias.to_lowercase())
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }
}

impl Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.operators.iter().map(|(k, v)| (k, v.name())))
            .finish()
    }
}

pub struct OperatorRegistryBuilder {
    registry: OperatorRegistry,
}

impl OperatorRegistryBuilder {
    /// Add (or replace) an alias. Aliases must be non empty and without whitespace.
    pub fn register(mut self, alias: &str, operator: Arc<dyn Operator>) -> Result<Self> {
        if alias.is_empty() || alias.chars().any(char::is_whitespace) {
            return Err(invalid_argument(format!(
                "Operator alias `{alias}` must be non empty and without whitespace"
            )));
        }
        self.registry
            .operators
            .insert(alias.to_lowercase(), operator);
        Ok(self)
    }

    pub fn build(self) -> OperatorRegistry {
        self.registry
    }

    /// Make this the process wide registry, fails if [`OperatorRegistry::global`] was already initialized.
    pub fn install(self) -> Result<()> {
        REGISTRY.set(self.registry).map_err(|_| {
            invalid_argument("The operator registry is already initialized, install it before its first use")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Equals, Not, Operator, OperatorRegistry};
    use crate::{ClauseContext, GenericSqlWriter, Value};

    fn render(operator: &dyn Operator, value: Value) -> (String, usize) {
        let writer = GenericSqlWriter::new();
        let mut context = ClauseContext::new(&writer);
        let sql = operator.render(&mut context, "\"id\"", value);
        (sql, context.parameters().len())
    }

    #[test]
    fn equals_special_cases() {
        assert_eq!(render(&Equals, Value::Int64(Some(1))), ("\"id\" = ?".into(), 1));
        assert_eq!(render(&Equals, Value::Null), ("\"id\" IS NULL".into(), 0));
        assert_eq!(
            render(&Equals, Value::List(Some(vec![]))),
            ("\"id\" IS NULL".into(), 0)
        );
        assert_eq!(
            render(
                &Equals,
                Value::List(Some(vec![Value::Int64(Some(5)), Value::Int64(Some(8))]))
            ),
            ("\"id\" IN (?, ?)".into(), 2)
        );
    }

    #[test]
    fn not_mirrors_equals() {
        assert_eq!(render(&Not, Value::Int64(Some(1))), ("\"id\" != ?".into(), 1));
        assert_eq!(render(&Not, Value::Varchar(None)), ("\"id\" IS NOT NULL".into(), 0));
        assert_eq!(
            render(&Not, Value::List(Some(vec![Value::Int64(Some(5))]))),
            ("\"id\" NOT IN (?)".into(), 1)
        );
    }

    #[test]
    fn builtin_aliases() {
        let registry = OperatorRegistry::builder().build();
        for (alias, name) in [
            ("=", "Equals"),
            ("equals", "Equals"),
            ("!=", "Not"),
            ("greaterThan", "GreaterThan"),
            ("lessThanOrEquals", "LessThanOrEquals"),
            ("LIKE", "Like"),
        ] {
            assert_eq!(registry.get(alias).map(|v| v.name()), Some(name));
        }
        assert!(registry.get("between").is_none());
        assert!(
            OperatorRegistry::builder()
                .register("is not", registry.get("!=").unwrap().clone())
                .is_err()
        );
    }
}
