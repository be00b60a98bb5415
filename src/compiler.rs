use crate::{
    expr::Expr,
    nodes::{Combinator, Condition, Grouping, Node},
    predicates::{CompareOp, Operator, Predicate},
    schema::AttributeReference,
    search::SearchOptions,
    values::Value,
};
use itertools::Itertools;
use tracing::debug;

/// Compile a grouping into its boolean expression.
///
/// Children that resolve to absent are skipped; a grouping left with no
/// contributing children compiles to [`Expr::True`], never to an error or a
/// match-nothing expression.
pub(crate) fn compile_grouping(grouping: &Grouping, options: &SearchOptions) -> Expr {
    let children = grouping
        .children()
        .iter()
        .filter_map(|node| match node {
            Node::Condition(condition) => compile_condition(condition, options),
            Node::Grouping(child) => match compile_grouping(child, options) {
                Expr::True => None,
                expression => Some(expression),
            },
            Node::Expr(expression) => Some(expression.clone()),
        })
        .collect_vec();
    combine(children, grouping.combinator())
}

/// Compile one condition, or `None` when it contributes nothing.
pub(crate) fn compile_condition(condition: &Condition, options: &SearchOptions) -> Option<Expr> {
    if !condition.is_valid() {
        debug!(
            predicate = condition.predicate().name(),
            "condition values failed validation"
        );
        return None;
    }
    let per_attribute = condition
        .attributes()
        .iter()
        .filter_map(|attribute| compile_attribute(attribute, condition, options))
        .collect_vec();
    if per_attribute.is_empty() {
        return None;
    }
    Some(combine(per_attribute, condition.combinator()))
}

fn combine(mut children: Vec<Expr>, combinator: Combinator) -> Expr {
    match children.len() {
        0 => Expr::True,
        1 => children.remove(0),
        _ => match combinator {
            Combinator::And => Expr::And(children),
            Combinator::Or => Expr::Or(children),
        },
    }
}

fn compile_attribute(
    attribute: &AttributeReference,
    condition: &Condition,
    options: &SearchOptions,
) -> Option<Expr> {
    let predicate = condition.predicate();
    match predicate.compound() {
        // `_any`/`_all` fan one comparison per value.
        Some(combinator) => {
            let leaves = condition
                .values()
                .iter()
                .filter_map(|value| {
                    let operand = if predicate.wants_array() {
                        predicate.format(collection_operand(std::slice::from_ref(value), options))
                    } else {
                        predicate.format(value.clone())
                    };
                    leaf(attribute, predicate, operand)
                })
                .collect_vec();
            (!leaves.is_empty()).then(|| combine(leaves, combinator))
        }
        None if predicate.wants_array() => {
            let operand = predicate.format(collection_operand(condition.values(), options));
            leaf(attribute, predicate, operand)
        }
        None => {
            let operand = predicate.format(condition.values().first()?.clone());
            leaf(attribute, predicate, operand)
        }
    }
}

/// Assemble the collection operand of an array-valued predicate. Tuples keep
/// their row-value shape only when the backend declared support; otherwise
/// they flatten into the scalar list.
fn collection_operand(values: &[Value], options: &SearchOptions) -> Value {
    let mut elements = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(inner) => {
                for element in inner {
                    push_element(&mut elements, element, options);
                }
            }
            other => push_element(&mut elements, other, options),
        }
    }
    Value::Array(elements)
}

fn push_element(elements: &mut Vec<Value>, value: &Value, options: &SearchOptions) {
    match value {
        Value::Tuple(inner) if !options.row_value_in => {
            elements.extend(inner.iter().cloned());
        }
        other => elements.push(other.clone()),
    }
}

/// Emit the comparison(s) for one attribute, resolving value-dependent
/// operators.
fn leaf(attribute: &AttributeReference, predicate: &Predicate, operand: Value) -> Option<Expr> {
    let comparison = |operator: CompareOp, value: Value| Expr::Comparison {
        attribute: attribute.clone(),
        operator,
        value,
    };
    match predicate.operator() {
        Operator::Compare(operator) => Some(comparison(*operator, operand)),
        Operator::Truth { target, negated } => {
            let truthy = operand.as_boolean()?;
            let operator = if truthy != *negated {
                CompareOp::Eq
            } else {
                CompareOp::NotEq
            };
            Some(comparison(operator, Value::Boolean(*target)))
        }
        Operator::Presence { negated } => {
            let truthy = operand.as_boolean()?;
            let operator = if truthy == *negated {
                CompareOp::In
            } else {
                CompareOp::NotIn
            };
            Some(comparison(
                operator,
                Value::Array(vec![Value::Null, Value::from("")]),
            ))
        }
        Operator::Nullness { negated } => {
            let truthy = operand.as_boolean()?;
            let operator = if truthy != *negated {
                CompareOp::IsNull
            } else {
                CompareOp::IsNotNull
            };
            Some(comparison(operator, Value::Null))
        }
        Operator::WithBlank(operator) => Some(Expr::Or(vec![
            comparison(*operator, operand),
            comparison(CompareOp::IsNull, Value::Null),
            comparison(CompareOp::Eq, Value::from("")),
        ])),
    }
}
