//! Generic expression tree to SQL predicate compiler.
//!
//! # Responsibility
//! - Walk comparisons and AND/OR composites into one SQL predicate.
//! - Collect every bound parameter the predicate needs.
//!
//! # Invariants
//! - Compilation is pure; parameters are returned with the predicate and
//!   never outlive one `compile` call.
//! - `In` inlines escaped literals and registers no parameter; every other
//!   comparator registers exactly one parameter named after its field.
//! - An empty composite compiles to no predicate (no filtering), never to
//!   "no rows".

use super::error::{QueryError, QueryResult};
use super::expression::{Comparator, Comparison, Composite, CompositeType, Expression};
use super::parameters::ParameterMap;
use crate::storage::expression_builder::ExpressionBuilder;

/// Output of [`ExpressionCompiler::compile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledExpression {
    /// `None` means the expression does not filter anything.
    pub predicate: Option<String>,
    pub parameters: ParameterMap,
}

/// Compiles expressions against one query source alias.
#[derive(Debug, Clone)]
pub struct ExpressionCompiler {
    expr: ExpressionBuilder,
    source_alias: String,
}

impl ExpressionCompiler {
    pub fn new(source_alias: impl Into<String>) -> Self {
        Self {
            expr: ExpressionBuilder,
            source_alias: source_alias.into(),
        }
    }

    pub fn compile(&self, expression: &Expression) -> QueryResult<CompiledExpression> {
        let mut parameters = ParameterMap::new();
        let predicate = self.dispatch(expression, &mut parameters)?;
        Ok(CompiledExpression {
            predicate,
            parameters,
        })
    }

    fn dispatch(
        &self,
        expression: &Expression,
        parameters: &mut ParameterMap,
    ) -> QueryResult<Option<String>> {
        match expression {
            Expression::Comparison(comparison) => {
                self.walk_comparison(comparison, parameters).map(Some)
            }
            Expression::Composite(composite) => self.walk_composite(composite, parameters),
        }
    }

    fn walk_comparison(
        &self,
        comparison: &Comparison,
        parameters: &mut ParameterMap,
    ) -> QueryResult<String> {
        let field = comparison.field.as_str();
        let column = qualify_field(&self.source_alias, field);
        let value = comparison.value.clone();

        let predicate = match comparison.comparator {
            Comparator::Equals => self.expr.eq(&column, &parameters.register(field, value)),
            Comparator::NotEquals => self.expr.neq(&column, &parameters.register(field, value)),
            Comparator::LessThan => self.expr.lt(&column, &parameters.register(field, value)),
            Comparator::LessThanEqual => {
                self.expr.lte(&column, &parameters.register(field, value))
            }
            Comparator::GreaterThan => self.expr.gt(&column, &parameters.register(field, value)),
            Comparator::GreaterThanEqual => {
                self.expr.gte(&column, &parameters.register(field, value))
            }
            Comparator::In => {
                let items = value.as_list().ok_or_else(|| QueryError::NonListValue {
                    field: field.to_string(),
                    comparator: Comparator::In.to_string(),
                })?;
                let literals = items
                    .iter()
                    .map(|item| self.expr.literal(item))
                    .collect::<Vec<_>>();
                self.expr.in_list(&column, &literals)
            }
            Comparator::NotIn => self.expr.not_in(&column, &parameters.register(field, value)),
            Comparator::Contains => self.expr.like(&column, &parameters.register(field, value)),
            Comparator::NotContains => {
                self.expr.not_like(&column, &parameters.register(field, value))
            }
            Comparator::Null => {
                parameters.register(field, value);
                self.expr.is_null(&column)
            }
            Comparator::NotNull => {
                parameters.register(field, value);
                self.expr.is_not_null(&column)
            }
        };

        Ok(predicate)
    }

    fn walk_composite(
        &self,
        composite: &Composite,
        parameters: &mut ParameterMap,
    ) -> QueryResult<Option<String>> {
        let mut parts = Vec::with_capacity(composite.children.len());
        for child in &composite.children {
            if let Some(part) = self.dispatch(child, parameters)? {
                parts.push(part);
            }
        }

        Ok(match composite.kind {
            CompositeType::And => self.expr.and_x(parts),
            CompositeType::Or => self.expr.or_x(parts),
        })
    }
}

/// Qualifies a bare field with `alias`; dotted fields are already qualified.
pub fn qualify_field(alias: &str, field: &str) -> String {
    if field.contains('.') {
        return field.to_string();
    }
    format!("{alias}.{field}")
}

#[cfg(test)]
mod tests {
    use super::ExpressionCompiler;
    use crate::model::value::Value;
    use crate::query::error::QueryError;
    use crate::query::expression::{Comparator, Expression};

    fn compiler() -> ExpressionCompiler {
        ExpressionCompiler::new("a")
    }

    #[test]
    fn empty_composite_compiles_to_no_predicate() {
        let compiled = compiler().compile(&Expression::and(Vec::new())).unwrap();
        assert!(compiled.predicate.is_none());
        assert!(compiled.parameters.is_empty());
    }

    #[test]
    fn nested_empty_composites_are_skipped() {
        let expr = Expression::or(vec![
            Expression::and(Vec::new()),
            Expression::comparison(Comparator::Equals, "title", "Hello"),
        ]);
        let compiled = compiler().compile(&expr).unwrap();
        assert_eq!(compiled.predicate.as_deref(), Some("a.title = :title"));
    }

    #[test]
    fn binary_comparators_bind_one_parameter_with_unchanged_value() {
        let cases = [
            (Comparator::Equals, "a.rank = :rank"),
            (Comparator::NotEquals, "a.rank <> :rank"),
            (Comparator::LessThan, "a.rank < :rank"),
            (Comparator::LessThanEqual, "a.rank <= :rank"),
            (Comparator::GreaterThan, "a.rank > :rank"),
            (Comparator::GreaterThanEqual, "a.rank >= :rank"),
        ];

        for (comparator, expected) in cases {
            let compiled = compiler()
                .compile(&Expression::comparison(comparator, "rank", 42))
                .unwrap();
            assert_eq!(compiled.predicate.as_deref(), Some(expected));
            assert_eq!(compiled.parameters.len(), 1);
            assert_eq!(compiled.parameters.get("rank"), Some(&Value::Integer(42)));
        }
    }

    #[test]
    fn in_inlines_literals_without_parameters() {
        let expr = Expression::comparison(
            Comparator::In,
            "title",
            vec![Value::from("aaaa"), Value::from("it's")],
        );
        let compiled = compiler().compile(&expr).unwrap();
        assert_eq!(
            compiled.predicate.as_deref(),
            Some("a.title IN ('aaaa', 'it''s')")
        );
        assert!(compiled.parameters.is_empty());
    }

    #[test]
    fn in_requires_a_list_value() {
        let err = compiler()
            .compile(&Expression::comparison(Comparator::In, "id", 1))
            .unwrap_err();
        assert!(matches!(err, QueryError::NonListValue { .. }));
    }

    #[test]
    fn not_in_binds_the_whole_list() {
        let compiled = compiler()
            .compile(&Expression::comparison(Comparator::NotIn, "id", vec![1, 2]))
            .unwrap();
        assert_eq!(compiled.predicate.as_deref(), Some("a.id NOT IN (:id)"));
        assert_eq!(compiled.parameters.get("id"), Some(&Value::from(vec![1, 2])));
    }

    #[test]
    fn contains_binds_pattern_unchanged() {
        let compiled = compiler()
            .compile(&Expression::comparison(Comparator::NotContains, "title", "%ell%"))
            .unwrap();
        assert_eq!(compiled.predicate.as_deref(), Some("a.title NOT LIKE :title"));
        assert_eq!(compiled.parameters.get("title"), Some(&Value::from("%ell%")));
    }

    #[test]
    fn null_checks_register_ignored_parameter() {
        let compiled = compiler()
            .compile(&Expression::comparison(Comparator::Null, "body", Value::Null))
            .unwrap();
        assert_eq!(compiled.predicate.as_deref(), Some("a.body IS NULL"));
        assert_eq!(compiled.parameters.get("body"), Some(&Value::Null));

        let compiled = compiler()
            .compile(&Expression::comparison(Comparator::NotNull, "body", Value::Null))
            .unwrap();
        assert_eq!(compiled.predicate.as_deref(), Some("a.body IS NOT NULL"));
    }

    #[test]
    fn qualified_fields_pass_through_and_name_parameters_with_underscores() {
        let compiled = compiler()
            .compile(&Expression::comparison(Comparator::Equals, "w.name", "Ann"))
            .unwrap();
        assert_eq!(compiled.predicate.as_deref(), Some("w.name = :w_name"));
        assert_eq!(compiled.parameters.get("w_name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn composites_nest_with_explicit_grouping() {
        let expr = Expression::and(vec![
            Expression::comparison(Comparator::GreaterThan, "rank", 1),
            Expression::or(vec![
                Expression::comparison(Comparator::Equals, "title", "a"),
                Expression::comparison(Comparator::Null, "body", Value::Null),
            ]),
        ]);
        let compiled = compiler().compile(&expr).unwrap();
        assert_eq!(
            compiled.predicate.as_deref(),
            Some("(a.rank > :rank) AND ((a.title = :title) OR (a.body IS NULL))")
        );
        assert_eq!(compiled.parameters.len(), 3);
    }

    #[test]
    fn colliding_parameter_names_keep_last_value() {
        let expr = Expression::and(vec![
            Expression::comparison(Comparator::GreaterThan, "rank", 1),
            Expression::comparison(Comparator::LessThan, "rank", 9),
        ]);
        let compiled = compiler().compile(&expr).unwrap();
        assert_eq!(compiled.parameters.len(), 1);
        assert_eq!(compiled.parameters.get("rank"), Some(&Value::Integer(9)));
    }
}
