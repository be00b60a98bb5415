use crate::{error::ConfigError, nodes::Combinator, values::Value};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    sync::Arc,
};

type ValueFormatter = Arc<dyn Fn(Value) -> Value + Send + Sync>;
type ValueValidator = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// The primitive comparison tags a backend maps to its own operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    Like,
    NotLike,
    ILike,
    NotILike,
    IsNull,
    IsNotNull,
}

impl Display for CompareOp {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(formatter, "="),
            Self::NotEq => write!(formatter, "<>"),
            Self::Lt => write!(formatter, "<"),
            Self::LtEq => write!(formatter, "<="),
            Self::Gt => write!(formatter, ">"),
            Self::GtEq => write!(formatter, ">="),
            Self::In => write!(formatter, "IN"),
            Self::NotIn => write!(formatter, "NOT IN"),
            Self::Like => write!(formatter, "LIKE"),
            Self::NotLike => write!(formatter, "NOT LIKE"),
            Self::ILike => write!(formatter, "ILIKE"),
            Self::NotILike => write!(formatter, "NOT ILIKE"),
            Self::IsNull => write!(formatter, "IS NULL"),
            Self::IsNotNull => write!(formatter, "IS NOT NULL"),
        }
    }
}

/// How a predicate turns into comparisons.
///
/// `Compare` is the plain case. `Truth`, `Presence` and `Nullness` resolve
/// their effective comparison from the raw value's truthiness at compile
/// time. `WithBlank` is the derived-predicate case: the base comparison is
/// augmented with `OR attribute IS NULL OR attribute = ''`, built from
/// primitive comparisons, no dedicated tree nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Compare(CompareOp),
    Truth { target: bool, negated: bool },
    Presence { negated: bool },
    Nullness { negated: bool },
    WithBlank(CompareOp),
}

/// An immutable predicate definition: the comparison operator plus the
/// formatting and validation rules applied to raw values.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    operator: Operator,
    formatter: Option<ValueFormatter>,
    validator: Option<ValueValidator>,
    compounds: bool,
    wants_array: bool,
    negative: bool,
    compound: Option<Combinator>,
}

impl Predicate {
    pub fn new(name: &str, operator: Operator) -> Self {
        Self {
            name: name.to_owned(),
            operator,
            formatter: None,
            validator: None,
            compounds: false,
            wants_array: false,
            negative: false,
            compound: None,
        }
    }

    /// Allow the `_any`/`_all` compound suffixes on this predicate.
    pub fn compoundable(mut self) -> Self {
        self.compounds = true;
        self
    }

    /// Treat the raw value as a collection operand even when scalar.
    pub fn array_valued(mut self) -> Self {
        self.wants_array = true;
        self
    }

    /// Mark this predicate as a semantic negative (`not_eq` and friends).
    pub fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn is_compoundable(&self) -> bool {
        self.compounds
    }

    pub fn wants_array(&self) -> bool {
        self.wants_array
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// The values fan-out of a synthesized `_any`/`_all` variant.
    pub fn compound(&self) -> Option<Combinator> {
        self.compound
    }

    /// Whether `values` is acceptable input for this predicate. The default
    /// rule requires at least one non-blank value, which is what makes an
    /// empty `in` target set mean "no constraint given" instead of
    /// "match nothing".
    pub fn validate(&self, values: &[Value]) -> bool {
        match &self.validator {
            Some(validator) => validator(values),
            None => values.iter().any(|value| !value.is_blank()),
        }
    }

    /// Apply the value formatter, if any.
    pub fn format(&self, value: Value) -> Value {
        match &self.formatter {
            Some(formatter) => formatter(value),
            None => value,
        }
    }

    fn to_compound(&self, name: &str, combinator: Combinator) -> Self {
        let mut predicate = self.clone();
        predicate.name = name.to_owned();
        predicate.compounds = false;
        predicate.compound = Some(combinator);
        predicate
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Predicate")
            .field("name", &self.name)
            .field("operator", &self.operator)
            .field("compounds", &self.compounds)
            .field("wants_array", &self.wants_array)
            .field("negative", &self.negative)
            .field("compound", &self.compound)
            .finish_non_exhaustive()
    }
}

/// Escape the pattern metacharacters of SQL `LIKE` (`\`, `%`, `_`) so raw
/// user input matches literally inside a generated pattern.
pub fn escape_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

/// The process-wide predicate table.
///
/// Mutated only during configuration; looked up for every parsed key
/// afterwards. Suffix detection is longest-first so `not_eq_all` wins over
/// `eq`, and `_any`/`_all` variants are synthesized from their base
/// predicate on demand rather than registered independently.
#[derive(Clone, Debug)]
pub struct PredicateRegistry {
    by_names: HashMap<String, Arc<Predicate>>,
    detection_index: Vec<String>,
}

impl PredicateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            by_names: HashMap::new(),
            detection_index: Vec::new(),
        }
    }

    /// The stock table: equality, ordering, set membership, the pattern
    /// family with wildcard escaping, boolean and presence polarity pairs,
    /// and the derived `in_or_blank`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for predicate in default_predicates() {
            // The default table carries no duplicates.
            let _ = registry.register(predicate);
        }
        registry
    }

    /// Add a predicate, rejecting duplicate names.
    pub fn register(&mut self, predicate: Predicate) -> Result<(), ConfigError> {
        if self.by_names.contains_key(predicate.name()) {
            return Err(ConfigError::DuplicatePredicate(predicate.name().to_owned()));
        }
        self.by_names
            .insert(predicate.name().to_owned(), Arc::new(predicate));
        self.rebuild_index();
        Ok(())
    }

    /// Add or override a predicate unconditionally.
    pub fn replace(&mut self, predicate: Predicate) {
        self.by_names
            .insert(predicate.name().to_owned(), Arc::new(predicate));
        self.rebuild_index();
    }

    /// Look up a predicate by its full name, synthesizing the `_any`/`_all`
    /// variant of a compound-capable base on demand.
    pub fn lookup(&self, name: &str) -> Option<Arc<Predicate>> {
        if let Some(predicate) = self.by_names.get(name) {
            return Some(predicate.clone());
        }
        let (base, combinator) = name
            .strip_suffix("_any")
            .map(|base| (base, Combinator::Or))
            .or_else(|| name.strip_suffix("_all").map(|base| (base, Combinator::And)))?;
        let base = self.by_names.get(base)?;
        base.is_compoundable()
            .then(|| Arc::new(base.to_compound(name, combinator)))
    }

    /// Strip the longest registered predicate suffix from a condition key,
    /// returning the remaining attribute expression and the predicate.
    pub fn detect<'k>(&self, key: &'k str) -> Option<(&'k str, Arc<Predicate>)> {
        for name in &self.detection_index {
            if key.len() > name.len() + 1
                && key.ends_with(name.as_str())
                && key.as_bytes()[key.len() - name.len() - 1] == b'_'
            {
                let stripped = &key[..key.len() - name.len() - 1];
                return Some((stripped, self.lookup(name)?));
            }
        }
        None
    }

    fn rebuild_index(&mut self) {
        let mut names = Vec::with_capacity(self.by_names.len() * 3);
        for predicate in self.by_names.values() {
            names.push(predicate.name().to_owned());
            if predicate.is_compoundable() {
                names.push(format!("{}_any", predicate.name()));
                names.push(format!("{}_all", predicate.name()));
            }
        }
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self.detection_index = names;
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_predicates() -> Vec<Predicate> {
    use CompareOp::*;

    let contains = |value: Value| Value::String(format!("%{}%", escape_wildcards(&value.text())));
    let starts = |value: Value| Value::String(format!("{}%", escape_wildcards(&value.text())));
    let ends = |value: Value| Value::String(format!("%{}", escape_wildcards(&value.text())));
    let boolean_token =
        |values: &[Value]| values.first().and_then(Value::as_boolean).is_some();

    vec![
        Predicate::new("eq", Operator::Compare(Eq)).compoundable(),
        Predicate::new("not_eq", Operator::Compare(NotEq))
            .compoundable()
            .negative(),
        Predicate::new("lt", Operator::Compare(Lt)).compoundable(),
        Predicate::new("lteq", Operator::Compare(LtEq)).compoundable(),
        Predicate::new("gt", Operator::Compare(Gt)).compoundable(),
        Predicate::new("gteq", Operator::Compare(GtEq)).compoundable(),
        Predicate::new("in", Operator::Compare(In))
            .array_valued()
            .compoundable(),
        Predicate::new("not_in", Operator::Compare(NotIn))
            .array_valued()
            .compoundable()
            .negative(),
        Predicate::new("in_or_blank", Operator::WithBlank(In))
            .array_valued()
            .compoundable(),
        Predicate::new("matches", Operator::Compare(Like)).compoundable(),
        Predicate::new("does_not_match", Operator::Compare(NotLike))
            .compoundable()
            .negative(),
        Predicate::new("cont", Operator::Compare(Like))
            .compoundable()
            .with_formatter(contains),
        Predicate::new("not_cont", Operator::Compare(NotLike))
            .compoundable()
            .negative()
            .with_formatter(contains),
        Predicate::new("i_cont", Operator::Compare(ILike))
            .compoundable()
            .with_formatter(contains),
        Predicate::new("not_i_cont", Operator::Compare(NotILike))
            .compoundable()
            .negative()
            .with_formatter(contains),
        Predicate::new("start", Operator::Compare(Like))
            .compoundable()
            .with_formatter(starts),
        Predicate::new("not_start", Operator::Compare(NotLike))
            .compoundable()
            .negative()
            .with_formatter(starts),
        Predicate::new("end", Operator::Compare(Like))
            .compoundable()
            .with_formatter(ends),
        Predicate::new("not_end", Operator::Compare(NotLike))
            .compoundable()
            .negative()
            .with_formatter(ends),
        Predicate::new(
            "true",
            Operator::Truth {
                target: true,
                negated: false,
            },
        )
        .with_validator(boolean_token),
        Predicate::new(
            "not_true",
            Operator::Truth {
                target: true,
                negated: true,
            },
        )
        .negative()
        .with_validator(boolean_token),
        Predicate::new(
            "false",
            Operator::Truth {
                target: false,
                negated: false,
            },
        )
        .with_validator(boolean_token),
        Predicate::new(
            "not_false",
            Operator::Truth {
                target: false,
                negated: true,
            },
        )
        .negative()
        .with_validator(boolean_token),
        Predicate::new("present", Operator::Presence { negated: false })
            .with_validator(boolean_token),
        Predicate::new("blank", Operator::Presence { negated: true })
            .negative()
            .with_validator(boolean_token),
        Predicate::new("null", Operator::Nullness { negated: false })
            .with_validator(boolean_token),
        Predicate::new("not_null", Operator::Nullness { negated: true })
            .negative()
            .with_validator(boolean_token),
    ]
}
