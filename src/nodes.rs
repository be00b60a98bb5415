use crate::{expr::Expr, predicates::Predicate, schema::AttributeReference, values::Value};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

/// How sibling expressions combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// Parse `"and"`/`"or"` (case-insensitive), defaulting to `And`.
    pub(crate) fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("or") {
            Self::Or
        } else {
            Self::And
        }
    }
}

impl Display for Combinator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => write!(formatter, "AND"),
            Self::Or => write!(formatter, "OR"),
        }
    }
}

/// One leaf filter: attribute(s), predicate and raw value(s).
///
/// Conditions hold more than one attribute when the key joined several with
/// `_or_`/`_and_`; the combinator governs how those per-attribute
/// comparisons combine. Values that fail the predicate's validator make the
/// whole condition absent at compile time rather than raising.
#[derive(Clone, Debug)]
pub struct Condition {
    attributes: Vec<AttributeReference>,
    predicate: Arc<Predicate>,
    combinator: Combinator,
    values: Vec<Value>,
}

impl Condition {
    pub fn new(
        attributes: Vec<AttributeReference>,
        predicate: Arc<Predicate>,
        combinator: Combinator,
        values: Vec<Value>,
    ) -> Self {
        debug_assert!(!attributes.is_empty());
        Self {
            attributes,
            predicate,
            combinator,
            values,
        }
    }

    pub fn attributes(&self) -> &[AttributeReference] {
        &self.attributes
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether the raw values pass the predicate's validator. Invalid
    /// conditions are dropped by the tree builder instead of being kept as
    /// placeholders.
    pub fn is_valid(&self) -> bool {
        self.predicate.validate(&self.values)
    }
}

/// A child of a [`Grouping`].
///
/// `Expr` children carry the pre-compiled output of a host named filter.
#[derive(Clone, Debug)]
pub enum Node {
    Condition(Condition),
    Grouping(Grouping),
    Expr(Expr),
}

/// A boolean AND/OR container of conditions and nested groupings.
///
/// An empty grouping, or one whose children all resolve to absent, compiles
/// to a no-op expression, never to an error or to "match nothing".
#[derive(Clone, Debug)]
pub struct Grouping {
    combinator: Combinator,
    children: Vec<Node>,
}

impl Grouping {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            children: Vec::new(),
        }
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.children.push(node);
    }
}
