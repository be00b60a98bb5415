use crate::{
    error::SearchError,
    name::Resolver,
    nodes::{Combinator, Condition, Grouping, Node},
    params::{ParamValue, Params, COMBINATOR_KEY, GROUPINGS_KEY, SORTS_KEY},
    schema::Schema,
    values::Value,
};
use tracing::debug;

/// Build a [`Grouping`] from a parameter map.
///
/// Flat entries go through the name parser and become conditions; entries
/// under the reserved `groupings` key recurse into child groupings. Child
/// order mirrors entry order. Conditions whose values fail their predicate's
/// validator are dropped here rather than kept as placeholders, so an
/// all-invalid map builds an empty grouping that later compiles to a no-op.
pub(crate) fn build_grouping(
    resolver: &Resolver<'_>,
    root: &Schema,
    params: &Params,
) -> Result<Grouping, SearchError> {
    let combinator = match params.get(COMBINATOR_KEY) {
        Some(ParamValue::Value(value)) => Combinator::from_token(&value.text()),
        _ => Combinator::And,
    };
    let mut grouping = Grouping::new(combinator);

    for (key, value) in params.entries() {
        if key == COMBINATOR_KEY || key == SORTS_KEY {
            continue;
        }
        if key == GROUPINGS_KEY {
            if let ParamValue::Groupings(groupings) = value {
                for sub_params in groupings {
                    let child = build_grouping(resolver, root, sub_params)?;
                    if child.is_empty() {
                        debug!("dropping an empty sub-grouping");
                        continue;
                    }
                    grouping.push(Node::Grouping(child));
                }
            }
            continue;
        }

        let ParamValue::Value(raw) = value else {
            debug!(key, "ignoring nested groupings under a non-reserved key");
            continue;
        };

        if let Some(filter) = root.named_filter(key) {
            if raw.as_boolean() == Some(false) {
                debug!(key, "named filter disabled by a falsy value");
                continue;
            }
            match filter.apply(raw) {
                Some(expression) => grouping.push(Node::Expr(expression)),
                None => debug!(key, "named filter contributed no constraint"),
            }
            continue;
        }

        match resolver.parse_condition_key(root, key)? {
            None => debug!(key, "ignoring an unresolvable condition"),
            Some(parsed) => {
                let values = match raw {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                let condition = Condition::new(
                    parsed.attributes,
                    parsed.predicate,
                    parsed.combinator,
                    values,
                );
                if condition.is_valid() {
                    grouping.push(Node::Condition(condition));
                } else {
                    debug!(key, "dropping a condition whose values failed validation");
                }
            }
        }
    }

    Ok(grouping)
}
