use crate::{
    expr::Expr,
    name::Resolver,
    predicates::{CompareOp, PredicateRegistry},
    schema::{AttributeReference, Authorizer, Schema, SchemaSet},
    search::SearchOptions,
    values::Value,
};
use std::collections::HashSet;

/// The schema catalog shared by the parser, builder, compiler and search
/// tests: articles with authors, co-authors, comments, self-referential
/// children and a polymorphic notable.
pub(crate) fn schemas() -> SchemaSet {
    let mut schemas = SchemaSet::new();
    schemas
        .insert(
            Schema::builder("articles")
                .string("title")
                .string("status")
                .integer("views")
                .boolean("published")
                .boolean("activated")
                .string("published_at")
                .association("author", "users")
                .association("co_authors", "users")
                .association("comments", "comments")
                .association("children", "articles")
                .polymorphic("notable", &["users", "articles"])
                .alias("headline", "title_or_status")
                .named_filter("activated", |_| {
                    Some(Expr::Comparison {
                        attribute: AttributeReference::new("articles", "activated", vec![]),
                        operator: CompareOp::Eq,
                        value: Value::Boolean(true),
                    })
                })
                .build()
                .unwrap(),
        )
        .unwrap();
    schemas
        .insert(
            Schema::builder("users")
                .string("name")
                .string("email")
                .association("company", "companies")
                .build()
                .unwrap(),
        )
        .unwrap();
    schemas
        .insert(Schema::builder("companies").string("name").build().unwrap())
        .unwrap();
    schemas
        .insert(
            Schema::builder("comments")
                .string("body")
                .integer("score")
                .build()
                .unwrap(),
        )
        .unwrap();
    schemas
}

#[derive(Default)]
struct DenyList {
    attributes: HashSet<(String, String)>,
    associations: HashSet<(String, String)>,
}

impl Authorizer for DenyList {
    fn attribute(&self, schema: &str, name: &str) -> bool {
        !self
            .attributes
            .contains(&(schema.to_owned(), name.to_owned()))
    }

    fn association(&self, schema: &str, name: &str) -> bool {
        !self
            .associations
            .contains(&(schema.to_owned(), name.to_owned()))
    }
}

/// Everything a [`Resolver`] borrows, bundled for tests.
pub(crate) struct Catalog {
    pub(crate) schemas: SchemaSet,
    pub(crate) registry: PredicateRegistry,
    pub(crate) options: SearchOptions,
    authorizer: DenyList,
}

impl Catalog {
    pub(crate) fn new() -> Self {
        Self {
            schemas: schemas(),
            registry: PredicateRegistry::with_defaults(),
            options: SearchOptions::default(),
            authorizer: DenyList::default(),
        }
    }

    pub(crate) fn root(&self) -> &Schema {
        self.schemas.get("articles").unwrap()
    }

    pub(crate) fn resolver(&self) -> Resolver<'_> {
        Resolver {
            schemas: &self.schemas,
            registry: &self.registry,
            authorizer: &self.authorizer,
            options: &self.options,
        }
    }

    pub(crate) fn deny_attribute(&mut self, schema: &str, name: &str) {
        self.authorizer
            .attributes
            .insert((schema.to_owned(), name.to_owned()));
    }

    pub(crate) fn deny_association(&mut self, schema: &str, name: &str) {
        self.authorizer
            .associations
            .insert((schema.to_owned(), name.to_owned()));
    }
}
