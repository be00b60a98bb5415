use crate::{error::ConfigError, expr::Expr, values::Value};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    sync::Arc,
};

/// The declared type of a filterable attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Integer,
    Decimal,
    Boolean,
}

/// A host-declared named filter.
///
/// Invoked when a parameter key matches the filter's name exactly; the closure
/// receives the raw value and returns the expression to splice into the tree,
/// or `None` for "no constraint". A falsy boolean value short-circuits before
/// the closure runs, so a filter sharing its name with a column never degrades
/// into a literal comparison when disabled.
#[derive(Clone)]
pub struct NamedFilter(Arc<dyn Fn(&Value) -> Option<Expr> + Send + Sync>);

impl NamedFilter {
    pub(crate) fn apply(&self, value: &Value) -> Option<Expr> {
        (self.0)(value)
    }
}

impl std::fmt::Debug for NamedFilter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("NamedFilter(..)")
    }
}

/// Where an association leads.
///
/// Polymorphic associations defer target selection to the parameter key,
/// which names the concrete target via an `of_<target>_type_` segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssociationTarget {
    Single(String),
    Polymorphic(Vec<String>),
}

/// The filterable surface of one model: attributes, associations, aliases and
/// named filters.
#[derive(Clone, Debug)]
pub struct Schema {
    name: String,
    attributes: HashMap<String, AttributeKind>,
    associations: HashMap<String, AssociationTarget>,
    aliases: HashMap<String, String>,
    filters: HashMap<String, NamedFilter>,
}

impl Schema {
    /// Start declaring a schema.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sift::Schema;
    ///
    /// let schema = Schema::builder("articles")
    ///     .string("title")
    ///     .string("status")
    ///     .integer("views")
    ///     .association("author", "users")
    ///     .build();
    /// assert!(schema.is_ok());
    /// ```
    ///
    /// Duplicate declarations are rejected:
    ///
    /// ```rust
    /// use sift::Schema;
    ///
    /// let schema = Schema::builder("articles")
    ///     .string("title")
    ///     .integer("title")
    ///     .build();
    /// assert!(schema.is_err());
    /// ```
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_owned(),
            attributes: Vec::new(),
            associations: Vec::new(),
            aliases: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeKind> {
        self.attributes.get(name).copied()
    }

    pub fn association(&self, name: &str) -> Option<&AssociationTarget> {
        self.associations.get(name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub(crate) fn named_filter(&self, name: &str) -> Option<&NamedFilter> {
        self.filters.get(name)
    }

    pub(crate) fn association_entries(
        &self,
    ) -> impl Iterator<Item = (&String, &AssociationTarget)> {
        self.associations.iter()
    }
}

/// Builder for [`Schema`]; `build` rejects duplicate declarations.
pub struct SchemaBuilder {
    name: String,
    attributes: Vec<(String, AttributeKind)>,
    associations: Vec<(String, AssociationTarget)>,
    aliases: Vec<(String, String)>,
    filters: Vec<(String, NamedFilter)>,
}

impl SchemaBuilder {
    pub fn attribute(mut self, name: &str, kind: AttributeKind) -> Self {
        self.attributes.push((name.to_owned(), kind));
        self
    }

    /// Declare a string attribute.
    pub fn string(self, name: &str) -> Self {
        self.attribute(name, AttributeKind::String)
    }

    /// Declare an integer attribute.
    pub fn integer(self, name: &str) -> Self {
        self.attribute(name, AttributeKind::Integer)
    }

    /// Declare a decimal attribute.
    pub fn decimal(self, name: &str) -> Self {
        self.attribute(name, AttributeKind::Decimal)
    }

    /// Declare a boolean attribute.
    pub fn boolean(self, name: &str) -> Self {
        self.attribute(name, AttributeKind::Boolean)
    }

    /// Declare an association traversable in parameter keys, targeting the
    /// schema registered under `target`.
    pub fn association(mut self, name: &str, target: &str) -> Self {
        self.associations
            .push((name.to_owned(), AssociationTarget::Single(target.to_owned())));
        self
    }

    /// Declare a polymorphic association whose concrete target is named in
    /// the parameter key.
    pub fn polymorphic(mut self, name: &str, targets: &[&str]) -> Self {
        let targets = targets.iter().map(|target| (*target).to_owned()).collect();
        self.associations
            .push((name.to_owned(), AssociationTarget::Polymorphic(targets)));
        self
    }

    /// Declare a shorthand standing in for a (possibly compound) attribute
    /// expression, e.g. `contact` for `name_or_email`.
    pub fn alias(mut self, name: &str, expansion: &str) -> Self {
        self.aliases.push((name.to_owned(), expansion.to_owned()));
        self
    }

    /// Declare a named filter (see [`NamedFilter`]).
    pub fn named_filter<F>(mut self, name: &str, filter: F) -> Self
    where
        F: Fn(&Value) -> Option<Expr> + Send + Sync + 'static,
    {
        self.filters
            .push((name.to_owned(), NamedFilter(Arc::new(filter))));
        self
    }

    pub fn build(self) -> Result<Schema, ConfigError> {
        let mut attributes = HashMap::with_capacity(self.attributes.len());
        for (name, kind) in self.attributes {
            if attributes.insert(name.clone(), kind).is_some() {
                return Err(ConfigError::DuplicateAttribute(name));
            }
        }
        let mut associations = HashMap::with_capacity(self.associations.len());
        for (name, target) in self.associations {
            if associations.insert(name.clone(), target).is_some() {
                return Err(ConfigError::DuplicateAssociation(name));
            }
        }
        let mut aliases = HashMap::with_capacity(self.aliases.len());
        for (name, expansion) in self.aliases {
            if aliases.insert(name.clone(), expansion).is_some() {
                return Err(ConfigError::DuplicateAlias(name));
            }
        }
        let mut filters = HashMap::with_capacity(self.filters.len());
        for (name, filter) in self.filters {
            if filters.insert(name.clone(), filter).is_some() {
                return Err(ConfigError::DuplicateFilter(name));
            }
        }

        Ok(Schema {
            name: self.name,
            attributes,
            associations,
            aliases,
            filters,
        })
    }
}

/// The registry of schemas association targets resolve through.
#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    by_names: HashMap<String, Schema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: Schema) -> Result<(), ConfigError> {
        let name = schema.name().to_owned();
        if self.by_names.insert(name.clone(), schema).is_some() {
            return Err(ConfigError::DuplicateSchema(name));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.by_names.get(name)
    }

    /// Every association target must name a schema in the set.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for schema in self.by_names.values() {
            for (association, target) in schema.association_entries() {
                let targets = match target {
                    AssociationTarget::Single(target) => std::slice::from_ref(target),
                    AssociationTarget::Polymorphic(targets) => targets.as_slice(),
                };
                for target in targets {
                    if !self.by_names.contains_key(target) {
                        return Err(ConfigError::UnknownTargetSchema {
                            schema: schema.name().to_owned(),
                            association: association.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// The authorization capability injected into name resolution.
///
/// A denial routes down the same path as an unknown name: the entry is
/// dropped or raised per [`crate::SearchOptions::ignore_unknown_conditions`],
/// never a hard crash.
pub trait Authorizer: Send + Sync {
    fn attribute(&self, _schema: &str, _name: &str) -> bool {
        true
    }

    fn association(&self, _schema: &str, _name: &str) -> bool {
        true
    }
}

/// The default authorizer: everything declared in the schema is fair game.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {}

/// A fully resolved attribute: the owning schema, the terminal attribute name
/// and the association path walked from the root. Every path segment was
/// validated as a traversable, authorized association when this was built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeReference {
    schema: String,
    name: String,
    path: Vec<String>,
}

impl AttributeReference {
    pub fn new(schema: &str, name: &str, path: Vec<String>) -> Self {
        Self {
            schema: schema.to_owned(),
            name: name.to_owned(),
            path,
        }
    }

    /// The schema the terminal attribute lives on.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The terminal attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The association names traversed from the root schema.
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl Display for AttributeReference {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        for segment in &self.path {
            write!(formatter, "{segment}.")?;
        }
        write!(formatter, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_build_a_schema_with_no_attributes() {
        assert!(Schema::builder("articles").build().is_ok());
    }

    #[test]
    fn can_build_a_schema_with_attributes_and_associations() {
        let schema = Schema::builder("articles")
            .string("title")
            .integer("views")
            .decimal("rating")
            .boolean("published")
            .association("author", "users")
            .polymorphic("subject", &["users", "articles"])
            .alias("headline", "title")
            .build();

        assert!(schema.is_ok());
    }

    #[test]
    fn return_an_error_on_duplicate_attributes() {
        let schema = Schema::builder("articles")
            .string("title")
            .integer("title")
            .build();

        assert_eq!(
            Err(ConfigError::DuplicateAttribute("title".to_owned())),
            schema.map(|_| ())
        );
    }

    #[test]
    fn return_an_error_on_duplicate_associations() {
        let schema = Schema::builder("articles")
            .association("author", "users")
            .association("author", "users")
            .build();

        assert!(schema.is_err());
    }

    #[test]
    fn return_an_error_on_duplicate_aliases() {
        let schema = Schema::builder("articles")
            .string("title")
            .alias("headline", "title")
            .alias("headline", "title")
            .build();

        assert!(schema.is_err());
    }

    #[test]
    fn can_look_up_declared_entries() {
        let schema = Schema::builder("articles")
            .string("title")
            .association("author", "users")
            .alias("headline", "title")
            .build()
            .unwrap();

        assert_eq!(Some(AttributeKind::String), schema.attribute("title"));
        assert_eq!(
            Some(&AssociationTarget::Single("users".to_owned())),
            schema.association("author")
        );
        assert_eq!(Some("title"), schema.alias("headline"));
        assert_eq!(None, schema.attribute("body"));
    }

    #[test]
    fn return_an_error_when_inserting_a_duplicate_schema() {
        let mut schemas = SchemaSet::new();
        schemas.insert(Schema::builder("articles").build().unwrap()).unwrap();

        let result = schemas.insert(Schema::builder("articles").build().unwrap());

        assert_eq!(
            Err(ConfigError::DuplicateSchema("articles".to_owned())),
            result
        );
    }

    #[test]
    fn return_an_error_when_an_association_targets_an_unknown_schema() {
        let mut schemas = SchemaSet::new();
        schemas
            .insert(
                Schema::builder("articles")
                    .association("author", "users")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(
            Err(ConfigError::UnknownTargetSchema {
                schema: "articles".to_owned(),
                association: "author".to_owned(),
                target: "users".to_owned(),
            }),
            schemas.validate()
        );
    }

    #[test]
    fn a_reference_displays_its_full_path() {
        let reference = AttributeReference::new(
            "users",
            "name",
            vec!["author".to_owned()],
        );

        assert_eq!("author.name", reference.to_string());
    }
}
