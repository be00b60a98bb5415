use crate::{
    error::SearchError,
    nodes::Combinator,
    predicates::{Predicate, PredicateRegistry},
    schema::{AssociationTarget, AttributeReference, Authorizer, Schema, SchemaSet},
    search::SearchOptions,
};
use itertools::Itertools;
use std::sync::Arc;
use tracing::trace;

/// The outcome of parsing one condition key: the attributes the key joined,
/// the detected predicate and the combinator governing the attributes.
#[derive(Debug)]
pub(crate) struct ParsedName {
    pub(crate) attributes: Vec<AttributeReference>,
    pub(crate) predicate: Arc<Predicate>,
    pub(crate) combinator: Combinator,
}

/// Resolves parameter keys against the schema namespace.
pub(crate) struct Resolver<'a> {
    pub(crate) schemas: &'a SchemaSet,
    pub(crate) registry: &'a PredicateRegistry,
    pub(crate) authorizer: &'a dyn Authorizer,
    pub(crate) options: &'a SearchOptions,
}

impl Resolver<'_> {
    /// Parse a flat condition key like `author_name_or_title_cont`.
    ///
    /// `Ok(None)` means the key did not resolve and policy says to ignore
    /// it; with `ignore_unknown_conditions` off the same situation is an
    /// `UnknownAttribute` error. Depth violations are errors regardless.
    pub(crate) fn parse_condition_key(
        &self,
        root: &Schema,
        key: &str,
    ) -> Result<Option<ParsedName>, SearchError> {
        let Some((expression, predicate)) = self.registry.detect(key) else {
            trace!(key, "no predicate suffix matched");
            return self.unknown(key);
        };
        match self.parse_attribute_expression(root, expression)? {
            Some((attributes, combinator)) => {
                // A lone attribute takes its combinator from the compound
                // suffix, `_any` reading as OR and `_all` as AND.
                let combinator = if attributes.len() > 1 {
                    combinator
                } else {
                    predicate.compound().unwrap_or(combinator)
                };
                Ok(Some(ParsedName {
                    attributes,
                    predicate,
                    combinator,
                }))
            }
            None => self.unknown(key),
        }
    }

    /// Resolve a predicate-less sort name. Sorts never raise: anything that
    /// fails to resolve, including a depth violation, is dropped.
    pub(crate) fn parse_sort_name(
        &self,
        root: &Schema,
        name: &str,
    ) -> Option<AttributeReference> {
        match self.parse_attribute_expression(root, name) {
            Ok(Some((attributes, _))) if attributes.len() == 1 => attributes.into_iter().next(),
            _ => None,
        }
    }

    fn unknown(&self, key: &str) -> Result<Option<ParsedName>, SearchError> {
        if self.options.ignore_unknown_conditions {
            Ok(None)
        } else {
            Err(SearchError::UnknownAttribute(key.to_owned()))
        }
    }

    /// Resolve an attribute expression, splitting on `_or_`/`_and_` only
    /// when the whole expression does not resolve as a single name, so
    /// attributes and associations containing those infixes are not
    /// mis-split.
    fn parse_attribute_expression(
        &self,
        root: &Schema,
        expression: &str,
    ) -> Result<Option<(Vec<AttributeReference>, Combinator)>, SearchError> {
        let expression = root.alias(expression).unwrap_or(expression);
        if let Some(attribute) = self.resolve(root, expression, &mut Vec::new())? {
            return Ok(Some((vec![attribute], Combinator::And)));
        }
        for (infix, combinator) in [("_or_", Combinator::Or), ("_and_", Combinator::And)] {
            if !expression.contains(infix) {
                continue;
            }
            let parts = expression.split(infix).collect_vec();
            let mut attributes = Vec::with_capacity(parts.len());
            for &part in &parts {
                let part = root.alias(part).unwrap_or(part);
                match self.resolve(root, part, &mut Vec::new())? {
                    Some(attribute) => attributes.push(attribute),
                    None => break,
                }
            }
            if attributes.len() == parts.len() && attributes.len() > 1 {
                return Ok(Some((attributes, combinator)));
            }
        }
        Ok(None)
    }

    /// Left-to-right greedy resolution: the whole remainder as an attribute
    /// first, then progressively shorter segment prefixes as association
    /// names, descending and recursing on the rest.
    fn resolve(
        &self,
        schema: &Schema,
        expression: &str,
        path: &mut Vec<String>,
    ) -> Result<Option<AttributeReference>, SearchError> {
        if schema.attribute(expression).is_some()
            && self.authorizer.attribute(schema.name(), expression)
        {
            return Ok(Some(AttributeReference::new(
                schema.name(),
                expression,
                path.clone(),
            )));
        }

        let segments = expression.split('_').collect_vec();
        for length in (1..segments.len()).rev() {
            let candidate = segments[..length].join("_");
            let Some(target) = schema.association(&candidate) else {
                continue;
            };
            if !self.authorizer.association(schema.name(), &candidate) {
                continue;
            }
            let remainder = segments[length..].join("_");
            let Some((target_name, remainder)) = concrete_target(target, &remainder) else {
                continue;
            };
            if path.len() >= self.options.max_traversal_depth {
                let traversed = path
                    .iter()
                    .map(String::as_str)
                    .chain([candidate.as_str()])
                    .join(".");
                return Err(SearchError::UntraversableAssociation {
                    path: traversed,
                    limit: self.options.max_traversal_depth,
                });
            }
            let Some(next) = self.schemas.get(&target_name) else {
                continue;
            };
            path.push(candidate);
            if let Some(found) = self.resolve(next, &remainder, path)? {
                return Ok(Some(found));
            }
            path.pop();
        }
        Ok(None)
    }
}

/// Pick the concrete target schema of an association.
///
/// Polymorphic targets are named in the key itself: the remainder must read
/// `of_<target>_type_<rest>`, and `<target>` must be one of the declared
/// candidates.
fn concrete_target(target: &AssociationTarget, remainder: &str) -> Option<(String, String)> {
    match target {
        AssociationTarget::Single(name) => Some((name.clone(), remainder.to_owned())),
        AssociationTarget::Polymorphic(candidates) => {
            let rest = remainder.strip_prefix("of_")?;
            let mut search_from = 0;
            while let Some(found) = rest[search_from..].find("_type_") {
                let index = search_from + found;
                let type_name = &rest[..index];
                let tail = &rest[index + "_type_".len()..];
                if candidates.iter().any(|candidate| candidate == type_name) {
                    return Some((type_name.to_owned(), tail.to_owned()));
                }
                search_from = index + 1;
            }
            None
        }
    }
}
