use crate::{
    schema::{AttributeKind, AttributeReference, Schema},
    values::Value,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum RecordError {
    #[error("record refers to the non-existing attribute {0:?}")]
    UnknownAttribute(String),
    #[error("record refers to the non-existing association {0:?}")]
    UnknownAssociation(String),
    #[error("{name:?}: wrong types => expected: {expected:?}, found: {actual:?}")]
    WrongType {
        name: String,
        expected: AttributeKind,
        actual: AttributeKind,
    },
}

/// A [`Record`] builder.
///
/// Attribute names and types are validated against the schema as they are
/// set. Attributes left unset evaluate as `NULL`.
#[derive(Debug)]
pub struct RecordBuilder<'schema> {
    schema: &'schema Schema,
    values: HashMap<String, Value>,
    related: HashMap<String, Record>,
}

impl<'schema> RecordBuilder<'schema> {
    pub(crate) fn new(schema: &'schema Schema) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            related: HashMap::new(),
        }
    }

    /// Set the specified string attribute.
    pub fn with_string(&mut self, name: &str, value: &str) -> Result<(), RecordError> {
        self.add_value(name, AttributeKind::String, || {
            Value::String(value.to_owned())
        })
    }

    /// Set the specified integer attribute.
    pub fn with_integer(&mut self, name: &str, value: i64) -> Result<(), RecordError> {
        self.add_value(name, AttributeKind::Integer, || Value::Integer(value))
    }

    /// Set the specified decimal attribute.
    pub fn with_decimal(&mut self, name: &str, value: Decimal) -> Result<(), RecordError> {
        self.add_value(name, AttributeKind::Decimal, || Value::Decimal(value))
    }

    /// Set the specified boolean attribute.
    pub fn with_boolean(&mut self, name: &str, value: bool) -> Result<(), RecordError> {
        self.add_value(name, AttributeKind::Boolean, || Value::Boolean(value))
    }

    /// Set the specified attribute to `NULL`. The attribute must exist; any
    /// kind accepts `NULL`.
    pub fn with_null(&mut self, name: &str) -> Result<(), RecordError> {
        if self.schema.attribute(name).is_none() {
            return Err(RecordError::UnknownAttribute(name.to_owned()));
        }
        self.values.insert(name.to_owned(), Value::Null);
        Ok(())
    }

    /// Attach the record reached through the specified association.
    pub fn with_related(&mut self, name: &str, record: Record) -> Result<(), RecordError> {
        if self.schema.association(name).is_none() {
            return Err(RecordError::UnknownAssociation(name.to_owned()));
        }
        self.related.insert(name.to_owned(), record);
        Ok(())
    }

    pub fn build(self) -> Record {
        Record {
            values: self.values,
            related: self.related,
        }
    }

    fn add_value<F>(
        &mut self,
        name: &str,
        actual: AttributeKind,
        f: F,
    ) -> Result<(), RecordError>
    where
        F: FnOnce() -> Value,
    {
        let expected = self
            .schema
            .attribute(name)
            .ok_or_else(|| RecordError::UnknownAttribute(name.to_owned()))?;
        if expected != actual {
            return Err(RecordError::WrongType {
                name: name.to_owned(),
                expected,
                actual,
            });
        }
        self.values.insert(name.to_owned(), f());
        Ok(())
    }
}

/// An in-memory row the reference backend evaluates compiled expressions
/// against.
#[derive(Clone, Debug, Default)]
pub struct Record {
    values: HashMap<String, Value>,
    related: HashMap<String, Record>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn related(&self, name: &str) -> Option<&Record> {
        self.related.get(name)
    }

    /// Walk the reference's association path and fetch the terminal
    /// attribute. A missing link anywhere yields `None`, which evaluation
    /// treats as `NULL`.
    pub(crate) fn value_at(&self, reference: &AttributeReference) -> Option<&Value> {
        let mut record = self;
        for segment in reference.path() {
            record = record.related(segment)?;
        }
        record.get(reference.name())
    }
}

impl Schema {
    /// Start building a [`Record`] validated against this schema.
    pub fn record(&self) -> RecordBuilder<'_> {
        RecordBuilder::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles() -> Schema {
        Schema::builder("articles")
            .string("title")
            .integer("views")
            .decimal("rating")
            .boolean("published")
            .association("author", "users")
            .build()
            .unwrap()
    }

    #[test]
    fn can_build_a_record_with_no_attributes() {
        let schema = articles();

        let record = schema.record().build();

        assert_eq!(None, record.get("title"));
    }

    #[test]
    fn can_set_attributes_of_every_kind() {
        let schema = articles();
        let mut builder = schema.record();

        assert!(builder.with_string("title", "sifting").is_ok());
        assert!(builder.with_integer("views", 41).is_ok());
        assert!(builder.with_decimal("rating", Decimal::new(45, 1)).is_ok());
        assert!(builder.with_boolean("published", true).is_ok());

        let record = builder.build();
        assert_eq!(Some(&Value::from("sifting")), record.get("title"));
        assert_eq!(Some(&Value::Integer(41)), record.get("views"));
    }

    #[test]
    fn can_set_an_attribute_to_null() {
        let schema = articles();
        let mut builder = schema.record();

        builder.with_null("title").unwrap();

        assert_eq!(Some(&Value::Null), builder.build().get("title"));
    }

    #[test]
    fn return_an_error_when_setting_a_non_existing_attribute() {
        let schema = articles();
        let mut builder = schema.record();

        let result = builder.with_string("body", "text");

        assert_eq!(
            Err(RecordError::UnknownAttribute("body".to_owned())),
            result
        );
    }

    #[test]
    fn return_an_error_when_setting_an_attribute_with_a_mismatched_type() {
        let schema = articles();
        let mut builder = schema.record();

        let result = builder.with_integer("title", 1);

        assert_eq!(
            Err(RecordError::WrongType {
                name: "title".to_owned(),
                expected: AttributeKind::String,
                actual: AttributeKind::Integer,
            }),
            result
        );
    }

    #[test]
    fn return_an_error_when_attaching_a_non_existing_association() {
        let schema = articles();
        let mut builder = schema.record();

        let result = builder.with_related("reviewer", Record::default());

        assert_eq!(
            Err(RecordError::UnknownAssociation("reviewer".to_owned())),
            result
        );
    }

    #[test]
    fn can_fetch_a_value_through_an_association_path() {
        let users = Schema::builder("users").string("name").build().unwrap();
        let schema = articles();
        let mut author = users.record();
        author.with_string("name", "antoine").unwrap();
        let mut builder = schema.record();
        builder.with_related("author", author.build()).unwrap();
        let record = builder.build();

        let reference =
            AttributeReference::new("users", "name", vec!["author".to_owned()]);

        assert_eq!(Some(&Value::from("antoine")), record.value_at(&reference));
    }

    #[test]
    fn a_broken_association_path_yields_nothing() {
        let schema = articles();
        let record = schema.record().build();

        let reference =
            AttributeReference::new("users", "name", vec!["author".to_owned()]);

        assert_eq!(None, record.value_at(&reference));
    }
}
