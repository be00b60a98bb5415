use crate::{
    builder::build_grouping,
    compiler::compile_grouping,
    error::{ConfigError, SearchError},
    expr::Expr,
    name::Resolver,
    nodes::Grouping,
    params::{Params, SORTS_KEY},
    predicates::PredicateRegistry,
    schema::{AllowAll, Authorizer, SchemaSet},
    sorts::{parse_sorts, SortSpec},
};
use std::sync::Arc;

/// Policy knobs for parsing and compilation.
#[derive(Clone, Copy, Debug)]
pub struct SearchOptions {
    /// Drop entries whose key resolves to no predicate or attribute instead
    /// of raising `UnknownAttribute`.
    pub ignore_unknown_conditions: bool,
    /// How many associations a single key may traverse. Exceeding it is
    /// always an error: it guards against cycles through self-referential
    /// associations.
    pub max_traversal_depth: usize,
    /// Whether the backend understands row-value (tuple) `IN` operands.
    /// When off, tuple values flatten into the scalar list.
    pub row_value_in: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignore_unknown_conditions: true,
            max_traversal_depth: 8,
            row_value_in: false,
        }
    }
}

/// The long-lived entry point: schemas, predicates, authorization and
/// options, wired once at startup and shared read-only afterwards.
pub struct SearchEngine {
    schemas: SchemaSet,
    predicates: PredicateRegistry,
    authorizer: Arc<dyn Authorizer>,
    options: SearchOptions,
}

impl SearchEngine {
    /// Create an engine, verifying that every association target names a
    /// schema in the set.
    pub fn new(schemas: SchemaSet, predicates: PredicateRegistry) -> Result<Self, ConfigError> {
        schemas.validate()?;
        Ok(Self {
            schemas,
            predicates,
            authorizer: Arc::new(AllowAll),
            options: SearchOptions::default(),
        })
    }

    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Build a [`Search`] from a parameter map against the named root
    /// schema: the condition tree plus the ordered sort list.
    pub fn search(&self, root: &str, params: &Params) -> Result<Search, SearchError> {
        let schema = self
            .schemas
            .get(root)
            .ok_or_else(|| SearchError::UnknownSchema(root.to_owned()))?;
        let resolver = self.resolver();
        let grouping = build_grouping(&resolver, schema, params)?;
        let sorts = params
            .get(SORTS_KEY)
            .map(|value| parse_sorts(&resolver, schema, value))
            .unwrap_or_default();
        Ok(Search { grouping, sorts })
    }

    /// Compile a search's condition tree into its boolean expression.
    pub fn compile(&self, search: &Search) -> Expr {
        compile_grouping(search.grouping(), &self.options)
    }

    /// The ordered sort list, ready for the backend's ORDER BY equivalent.
    pub fn compile_sorts(&self, search: &Search) -> Vec<SortSpec> {
        search.sorts().to_vec()
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            schemas: &self.schemas,
            registry: &self.predicates,
            authorizer: self.authorizer.as_ref(),
            options: &self.options,
        }
    }
}

/// One request's worth of parsed search state, owned by that request and
/// discarded after the query is issued.
#[derive(Clone, Debug)]
pub struct Search {
    grouping: Grouping,
    sorts: Vec<SortSpec>,
}

impl Search {
    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.sorts
    }
}
