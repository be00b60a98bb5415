use crate::{
    name::Resolver,
    params::ParamValue,
    schema::{AttributeReference, Schema},
    splitter::split_expressions,
    values::Value,
};
use std::fmt::{Display, Formatter};
use tracing::debug;

/// A sort direction, defaulting to ascending on unrecognized input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl Display for Direction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(formatter, "ASC"),
            Self::Desc => write!(formatter, "DESC"),
        }
    }
}

/// One resolved sort entry. List order is significant: later entries break
/// ties of earlier ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    attribute: AttributeReference,
    direction: Direction,
}

impl SortSpec {
    pub fn attribute(&self) -> &AttributeReference {
        &self.attribute
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl Display for SortSpec {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} {}", self.attribute, self.direction)
    }
}

/// Parse the sort parameter into an ordered [`SortSpec`] list.
///
/// Accepted shapes: a single raw string (comma-joined entries go through
/// [`split_expressions`]), an array of raw strings, or `[name, direction]`
/// pairs. Names resolve through the predicate-less name parser; entries that
/// do not resolve are dropped, never raised.
pub(crate) fn parse_sorts(
    resolver: &Resolver<'_>,
    root: &Schema,
    value: &ParamValue,
) -> Vec<SortSpec> {
    let ParamValue::Value(value) = value else {
        debug!("ignoring a non-value sort parameter");
        return Vec::new();
    };
    let mut sorts = Vec::new();
    match value {
        Value::Array(entries) => {
            for entry in entries {
                match entry {
                    Value::Tuple(pair) => {
                        push_pair(&mut sorts, resolver, root, pair);
                    }
                    other => push_raw(&mut sorts, resolver, root, &other.text()),
                }
            }
        }
        other => push_raw(&mut sorts, resolver, root, &other.text()),
    }
    sorts
}

fn push_raw(sorts: &mut Vec<SortSpec>, resolver: &Resolver<'_>, root: &Schema, raw: &str) {
    for part in split_expressions(raw) {
        let (name, direction) = match part.rsplit_once(char::is_whitespace) {
            Some((name, token))
                if token.eq_ignore_ascii_case("asc") || token.eq_ignore_ascii_case("desc") =>
            {
                (name.trim_end(), Direction::from_token(token))
            }
            _ => (part.as_str(), Direction::Asc),
        };
        push_resolved(sorts, resolver, root, name, direction);
    }
}

fn push_pair(sorts: &mut Vec<SortSpec>, resolver: &Resolver<'_>, root: &Schema, pair: &[Value]) {
    let Some(name) = pair.first() else {
        return;
    };
    let direction = pair
        .get(1)
        .map(|token| Direction::from_token(&token.text()))
        .unwrap_or(Direction::Asc);
    push_resolved(sorts, resolver, root, &name.text(), direction);
}

fn push_resolved(
    sorts: &mut Vec<SortSpec>,
    resolver: &Resolver<'_>,
    root: &Schema,
    name: &str,
    direction: Direction,
) {
    match resolver.parse_sort_name(root, name.trim()) {
        Some(attribute) => sorts.push(SortSpec {
            attribute,
            direction,
        }),
        None => debug!(name, "dropping an unresolvable sort entry"),
    }
}
