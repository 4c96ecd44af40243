#[cfg(test)]
mod tests {
    use rivet::{
        ClauseContext, Equals, ErrorKind, GenericSqlWriter, Glue, Operator, OperatorRegistry,
        Value, compile, conditions,
    };
    use std::sync::Arc;

    /// `column BETWEEN ? AND ?`, the value is a two element list.
    struct Between;

    impl Operator for Between {
        fn name(&self) -> &'static str {
            "Between"
        }
        fn render(&self, context: &mut ClauseContext, column: &str, value: Value) -> String {
            let (low, high) = match value {
                Value::List(Some(mut values)) if values.len() == 2 => {
                    let high = values.pop().unwrap_or_default();
                    (values.pop().unwrap_or_default(), high)
                }
                v => (v.clone(), v),
            };
            format!(
                "{column} BETWEEN {} AND {}",
                context.parameter(low),
                context.parameter(high)
            )
        }
    }

    #[test]
    fn custom_registry() {
        let registry = OperatorRegistry::builder()
            .register("between", Arc::new(Between))
            .unwrap()
            .register("is", Arc::new(Equals))
            .unwrap()
            .build();
        assert_eq!(registry.get("BETWEEN").map(|v| v.name()), Some("Between"));
        assert_eq!(registry.get("gte").map(|v| v.name()), Some("GreaterThanOrEquals"));
        assert!(registry.aliases().any(|v| v == "between"));
        assert!(OperatorRegistry::global().get("between").is_none());

        let writer = GenericSqlWriter::new();
        let mut context = ClauseContext::new(&writer);
        let sql = compile(
            &conditions! { "founding_year between" => vec![1910, 1930], "name is" => "BMW" },
            Glue::And,
            &registry,
            &mut context,
        )
        .unwrap();
        assert_eq!(sql, r#""founding_year" BETWEEN ? AND ? AND "name" = ?"#);
        assert_eq!(
            context.parameters(),
            [
                Value::Int32(Some(1910)),
                Value::Int32(Some(1930)),
                Value::from("BMW")
            ]
        );

        let mut context = ClauseContext::new(&writer);
        let error = compile(
            &conditions! { "founding_year between" => vec![1910, 1930] },
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
    fn invalid_aliases() {
        for alias in ["", "not in", "\t"] {
            assert!(
                OperatorRegistry::builder()
                    .register(alias, Arc::new(Between))
                    .is_err()
            );
        }
    }

    #[test]
    fn replace_builtin() {
        let registry = OperatorRegistry::builder()
            .register("like", Arc::new(Between))
            .unwrap()
            .build();
        assert_eq!(registry.get("like").map(|v| v.name()), Some("Between"));
        assert_eq!(
            OperatorRegistry::global().get("like").map(|v| v.name()),
            Some("Like")
        );
    }
}
