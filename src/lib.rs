//! A predicate-driven search-condition compiler.
//!
//! `sift` takes a flat, user-supplied parameter map such as
//! `{"status_in_or_blank": ["active", "pending"]}`, resolves each key against
//! a host-declared schema (attributes, associations, aliases and named
//! filters) and compiles the whole map into a boolean expression tree plus an
//! ordered sort list. The host hands that tree to its own query backend; a
//! reference in-memory backend evaluates it directly against [`Record`]s.
//!
//! # Examples
//!
//! Compiling a parameter map into an expression:
//!
//! ```
//! use sift::{Params, PredicateRegistry, Schema, SchemaSet, SearchEngine};
//!
//! let mut schemas = SchemaSet::new();
//! schemas.insert(
//!     Schema::builder("articles")
//!         .string("title")
//!         .string("status")
//!         .integer("views")
//!         .association("author", "users")
//!         .build()
//!         .unwrap(),
//! ).unwrap();
//! schemas.insert(
//!     Schema::builder("users")
//!         .string("name")
//!         .string("email")
//!         .build()
//!         .unwrap(),
//! ).unwrap();
//!
//! let engine = SearchEngine::new(schemas, PredicateRegistry::with_defaults()).unwrap();
//! let params = Params::new()
//!     .with("title_cont", "boolean")
//!     .with("author_name_or_author_email_cont", "gagne")
//!     .with("sorts", "views desc, title");
//!
//! let search = engine.search("articles", &params).unwrap();
//! let expression = engine.compile(&search);
//! assert_eq!(
//!     "(title LIKE '%boolean%' AND (author.name LIKE '%gagne%' OR author.email LIKE '%gagne%'))",
//!     expression.to_string()
//! );
//! assert_eq!(2, engine.compile_sorts(&search).len());
//! ```
//!
//! Evaluating against the reference backend:
//!
//! ```
//! use sift::{Params, PredicateRegistry, Schema, SchemaSet, SearchEngine};
//!
//! let mut schemas = SchemaSet::new();
//! schemas.insert(
//!     Schema::builder("articles").string("status").build().unwrap(),
//! ).unwrap();
//! let engine = SearchEngine::new(schemas, PredicateRegistry::with_defaults()).unwrap();
//!
//! let params = Params::new().with("status_in_or_blank", vec!["active", "pending"]);
//! let search = engine.search("articles", &params).unwrap();
//! let expression = engine.compile(&search);
//!
//! // A row whose status was never set counts as blank and still matches.
//! let schema = engine.schemas().get("articles").unwrap();
//! let mut builder = schema.record();
//! builder.with_null("status").unwrap();
//! assert!(expression.evaluate(&builder.build()));
//! ```
//!
//! # Parameter keys
//!
//! A condition key is an attribute expression followed by a predicate
//! suffix. The attribute expression may traverse associations
//! (`author_name_eq`), join several attributes with `_or_`/`_and_`
//! (`title_or_status_cont`), go through a declared alias, or name a
//! polymorphic association's concrete target (`notable_of_users_type_name_eq`).
//! Predicate suffixes are stripped longest-first, so `not_eq_all` is never
//! misread as `eq`. The reserved keys are `combinator` (`"and"`/`"or"`),
//! `groupings` (a list of nested sub-grouping maps) and `sorts`.
//!
//! # Predicates
//!
//! The stock table covers `eq`/`not_eq`, the orderings `lt`/`lteq`/`gt`/`gteq`,
//! set membership `in`/`not_in`, the pattern family
//! `cont`/`start`/`end`/`matches` with their negative and case-insensitive
//! variants, the polarity pairs `true`/`false`, `present`/`blank` and
//! `null`/`not_null`, and the derived `in_or_blank`. Compound-capable
//! predicates accept `_any`/`_all` suffixes that fan one comparison per
//! value. Custom predicates register through [`PredicateRegistry`] with
//! their own operator, formatter and validator.
//!
//! # Degradation over failure
//!
//! Malformed user input degrades to "no constraint" instead of failing: a
//! condition whose values fail its predicate's validator is dropped, an
//! empty `in` target set drops the whole condition, and a grouping left
//! without children compiles to [`Expr::True`]. The two structural errors
//! that do surface are [`SearchError::UnknownAttribute`] (opt-in via
//! [`SearchOptions::ignore_unknown_conditions`]) and
//! [`SearchError::UntraversableAssociation`] (always raised).

mod builder;
mod compiler;
mod error;
mod expr;
mod name;
mod nodes;
mod params;
mod predicates;
mod records;
mod schema;
mod search;
mod sorts;
mod splitter;
#[cfg(test)]
mod test_utils;
mod values;

pub use crate::{
    error::{ConfigError, SearchError},
    expr::{Expr, ExpressionVisitor},
    nodes::{Combinator, Condition, Grouping, Node},
    params::{ParamValue, Params},
    predicates::{escape_wildcards, CompareOp, Operator, Predicate, PredicateRegistry},
    records::{Record, RecordBuilder, RecordError},
    schema::{
        AllowAll, AssociationTarget, AttributeKind, AttributeReference, Authorizer, NamedFilter,
        Schema, SchemaBuilder, SchemaSet,
    },
    search::{Search, SearchEngine, SearchOptions},
    sorts::{Direction, SortSpec},
    splitter::split_expressions,
    values::Value,
};
