use crate::{
    predicates::CompareOp,
    records::Record,
    schema::AttributeReference,
    values::Value,
};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A compiled boolean expression tree.
///
/// This is what the host hands to its own backend, either through
/// [`ExpressionVisitor`] or by walking the enum directly. `True` is the
/// no-op expression an empty grouping compiles to.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    True,
    Comparison {
        attribute: AttributeReference,
        operator: CompareOp,
        value: Value,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// The pluggable backend seam: implement this to turn a compiled tree into
/// the backend's native query representation.
pub trait ExpressionVisitor {
    type Output;

    fn visit_true(&mut self) -> Self::Output;

    fn visit_comparison(
        &mut self,
        attribute: &AttributeReference,
        operator: CompareOp,
        value: &Value,
    ) -> Self::Output;

    fn visit_and(&mut self, children: &[Expr]) -> Self::Output;

    fn visit_or(&mut self, children: &[Expr]) -> Self::Output;
}

impl Expr {
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::True => visitor.visit_true(),
            Self::Comparison {
                attribute,
                operator,
                value,
            } => visitor.visit_comparison(attribute, *operator, value),
            Self::And(children) => visitor.visit_and(children),
            Self::Or(children) => visitor.visit_or(children),
        }
    }

    /// Evaluate against an in-memory [`Record`], the crate's reference
    /// backend.
    ///
    /// Attributes the record never set evaluate as `NULL`. Unlike SQL's
    /// three-valued logic, this backend is two-valued: `NULL` compares equal
    /// to `NULL`, which is exactly what gives `blank`/`in_or_blank` their
    /// "matches missing data" semantics here.
    pub fn evaluate(&self, record: &Record) -> bool {
        match self {
            Self::True => true,
            Self::And(children) => children.iter().all(|child| child.evaluate(record)),
            Self::Or(children) => children.iter().any(|child| child.evaluate(record)),
            Self::Comparison {
                attribute,
                operator,
                value,
            } => {
                let null = Value::Null;
                let actual = record.value_at(attribute).unwrap_or(&null);
                apply(*operator, actual, value)
            }
        }
    }
}

fn apply(operator: CompareOp, actual: &Value, operand: &Value) -> bool {
    match operator {
        CompareOp::Eq => actual.equals(operand),
        CompareOp::NotEq => !actual.equals(operand),
        CompareOp::Lt => matches!(actual.compare(operand), Some(std::cmp::Ordering::Less)),
        CompareOp::LtEq => matches!(
            actual.compare(operand),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        CompareOp::Gt => matches!(actual.compare(operand), Some(std::cmp::Ordering::Greater)),
        CompareOp::GtEq => matches!(
            actual.compare(operand),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        CompareOp::In => contains(operand, actual),
        CompareOp::NotIn => !contains(operand, actual),
        CompareOp::Like => pattern_match(actual, operand, false),
        CompareOp::NotLike => !matches!(actual, Value::Null) && !pattern_match(actual, operand, false),
        CompareOp::ILike => pattern_match(actual, operand, true),
        CompareOp::NotILike => {
            !matches!(actual, Value::Null) && !pattern_match(actual, operand, true)
        }
        CompareOp::IsNull => matches!(actual, Value::Null),
        CompareOp::IsNotNull => !matches!(actual, Value::Null),
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(values) | Value::Tuple(values) => {
            values.iter().any(|value| needle.equals(value))
        }
        other => needle.equals(other),
    }
}

fn pattern_match(actual: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    if matches!(actual, Value::Null) {
        return false;
    }
    let mut text = actual.text();
    let mut pattern = pattern.text();
    if case_insensitive {
        text = text.to_lowercase();
        pattern = pattern.to_lowercase();
    }
    like_match(&text, &pattern)
}

/// SQL `LIKE` semantics: `%` matches any run, `_` a single character, `\`
/// escapes the next character.
fn like_match(text: &str, pattern: &str) -> bool {
    fn matches(text: &[char], pattern: &[char]) -> bool {
        let Some((first, rest)) = pattern.split_first() else {
            return text.is_empty();
        };
        match first {
            '%' => (0..=text.len()).any(|skip| matches(&text[skip..], rest)),
            '\\' => {
                // A trailing lone backslash matches itself.
                let (literal, rest) = match rest.split_first() {
                    Some((literal, rest)) => (*literal, rest),
                    None => ('\\', rest),
                };
                text.split_first()
                    .is_some_and(|(head, tail)| *head == literal && matches(tail, rest))
            }
            '_' => text
                .split_first()
                .is_some_and(|(_, tail)| matches(tail, rest)),
            literal => text
                .split_first()
                .is_some_and(|(head, tail)| head == literal && matches(tail, rest)),
        }
    }

    let text = text.chars().collect_vec();
    let pattern = pattern.chars().collect_vec();
    matches(&text, &pattern)
}

impl Display for Expr {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(formatter, "TRUE"),
            Self::Comparison {
                attribute,
                operator: operator @ (CompareOp::IsNull | CompareOp::IsNotNull),
                ..
            } => write!(formatter, "{attribute} {operator}"),
            Self::Comparison {
                attribute,
                operator,
                value,
            } => write!(formatter, "{attribute} {operator} {value}"),
            Self::And(children) => {
                write!(formatter, "({})", children.iter().join(" AND "))
            }
            Self::Or(children) => {
                write!(formatter, "({})", children.iter().join(" OR "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str) -> AttributeReference {
        AttributeReference::new("articles", name, vec![])
    }

    fn comparison(name: &str, operator: CompareOp, value: Value) -> Expr {
        Expr::Comparison {
            attribute: reference(name),
            operator,
            value,
        }
    }

    #[test]
    fn can_match_a_simple_pattern() {
        assert!(like_match("hello", "hello"));
        assert!(like_match("hello", "h%"));
        assert!(like_match("hello", "%llo"));
        assert!(like_match("hello", "h_llo"));
        assert!(!like_match("hello", "h_lo"));
        assert!(!like_match("hello", "world"));
    }

    #[test]
    fn percent_matches_the_empty_run() {
        assert!(like_match("", "%"));
        assert!(like_match("ab", "a%b"));
    }

    #[test]
    fn escaped_metacharacters_match_literally() {
        assert!(like_match("50%", "50\\%"));
        assert!(!like_match("50x", "50\\%"));
        assert!(like_match("a_b", "a\\_b"));
        assert!(!like_match("axb", "a\\_b"));
        assert!(like_match("a\\b", "a\\\\b"));
    }

    #[test]
    fn display_renders_a_sql_like_form() {
        let expression = Expr::And(vec![
            comparison("title", CompareOp::Like, Value::from("%rust%")),
            Expr::Or(vec![
                comparison("status", CompareOp::Eq, Value::from("active")),
                comparison("status", CompareOp::IsNull, Value::Null),
            ]),
        ]);

        assert_eq!(
            "(title LIKE '%rust%' AND (status = 'active' OR status IS NULL))",
            expression.to_string()
        );
    }

    #[test]
    fn a_true_expression_matches_any_record() {
        assert!(Expr::True.evaluate(&Record::default()));
    }

    #[test]
    fn a_comparison_against_an_unset_attribute_sees_null() {
        let expression = comparison("status", CompareOp::IsNull, Value::Null);

        assert!(expression.evaluate(&Record::default()));
    }

    #[test]
    fn null_never_satisfies_an_ordered_comparison() {
        let expression = comparison("views", CompareOp::Gt, Value::Integer(10));

        assert!(!expression.evaluate(&Record::default()));
    }

    #[test]
    fn null_never_satisfies_a_pattern_or_its_negation() {
        let positive = comparison("title", CompareOp::Like, Value::from("%a%"));
        let negative = comparison("title", CompareOp::NotLike, Value::from("%a%"));

        assert!(!positive.evaluate(&Record::default()));
        assert!(!negative.evaluate(&Record::default()));
    }

    #[test]
    fn a_visitor_walks_the_whole_tree() {
        struct Renderer;

        impl ExpressionVisitor for Renderer {
            type Output = String;

            fn visit_true(&mut self) -> String {
                "TRUE".to_owned()
            }

            fn visit_comparison(
                &mut self,
                attribute: &AttributeReference,
                operator: CompareOp,
                value: &Value,
            ) -> String {
                format!("{attribute} {operator} {value}")
            }

            fn visit_and(&mut self, children: &[Expr]) -> String {
                children.iter().map(|child| child.accept(self)).join(" & ")
            }

            fn visit_or(&mut self, children: &[Expr]) -> String {
                children.iter().map(|child| child.accept(self)).join(" | ")
            }
        }

        let expression = Expr::And(vec![
            comparison("views", CompareOp::Gt, Value::Integer(10)),
            Expr::Or(vec![
                comparison("status", CompareOp::Eq, Value::from("active")),
                Expr::True,
            ]),
        ]);

        assert_eq!(
            "views > 10 & status = 'active' | TRUE",
            expression.accept(&mut Renderer)
        );
    }

    #[test]
    fn membership_includes_null_when_the_target_set_has_it() {
        let expression = comparison(
            "status",
            CompareOp::In,
            Value::Array(vec![Value::Null, Value::from("")]),
        );

        assert!(expression.evaluate(&Record::default()));
    }
}
