use thiserror::Error;

/// Configuration-time failures.
///
/// These are raised immediately while declaring schemas or registering
/// predicates, never deferred to request time.
#[derive(Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("predicate {0:?} is already registered")]
    DuplicatePredicate(String),
    #[error("schema {0:?} has already been defined")]
    DuplicateSchema(String),
    #[error("attribute {0:?} has already been defined")]
    DuplicateAttribute(String),
    #[error("association {0:?} has already been defined")]
    DuplicateAssociation(String),
    #[error("alias {0:?} has already been defined")]
    DuplicateAlias(String),
    #[error("named filter {0:?} has already been defined")]
    DuplicateFilter(String),
    #[error("association {association:?} on {schema:?} targets the unknown schema {target:?}")]
    UnknownTargetSchema {
        schema: String,
        association: String,
        target: String,
    },
}

/// Request-time failures while parsing a parameter map.
///
/// `UnknownAttribute` is policy-controlled: with
/// [`crate::SearchOptions::ignore_unknown_conditions`] set (the default) the
/// offending entry is dropped instead. `UntraversableAssociation` is always
/// raised since it signals structural misuse of the API rather than a benign
/// unknown filter.
#[derive(Debug, PartialEq, Error)]
pub enum SearchError {
    #[error("no attribute or association matches {0:?}")]
    UnknownAttribute(String),
    #[error("association traversal for {path:?} exceeded the depth limit of {limit}")]
    UntraversableAssociation { path: String, limit: usize },
    #[error("unknown schema {0:?}")]
    UnknownSchema(String),
}
