use crate::values::Value;

/// The key holding a grouping's combinator (`"and"`/`"or"`).
pub(crate) const COMBINATOR_KEY: &str = "combinator";
/// The key holding nested sub-groupings.
pub(crate) const GROUPINGS_KEY: &str = "groupings";
/// The key holding the sort list, meaningful at the top level only.
pub(crate) const SORTS_KEY: &str = "sorts";

/// One parameter entry: a raw condition value, or the nested sub-groupings
/// under the reserved `groupings` key.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Value(Value),
    Groupings(Vec<Params>),
}

/// An insertion-ordered parameter map.
///
/// Entry order is preserved into the condition tree, so compiling the same
/// parameters twice yields the same expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sift::Params;
    ///
    /// let params = Params::new()
    ///     .with("title_cont", "rust")
    ///     .with("status_in", vec!["active", "pending"]);
    /// assert_eq!(2, params.len());
    /// ```
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries
            .push((key.to_owned(), ParamValue::Value(value.into())));
        self
    }

    /// Add nested sub-groupings under the reserved `groupings` key.
    pub fn with_groupings(mut self, groupings: Vec<Params>) -> Self {
        self.entries
            .push((GROUPINGS_KEY.to_owned(), ParamValue::Groupings(groupings)));
        self
    }

    pub fn insert(&mut self, key: &str, value: ParamValue) {
        self.entries.push((key.to_owned(), value));
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a decoded JSON object, keeping key encounter order.
    /// Anything but an object yields `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sift::Params;
    ///
    /// let json = serde_json::json!({
    ///     "title_cont": "rust",
    ///     "groupings": [{"combinator": "or", "views_gt": 100}],
    /// });
    /// let params = Params::from_json(&json).unwrap();
    /// assert_eq!(2, params.len());
    /// ```
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut params = Self::new();
        for (key, value) in object {
            if key == GROUPINGS_KEY {
                if let Some(list) = value.as_array() {
                    let groupings = list.iter().filter_map(Self::from_json).collect();
                    params.insert(key, ParamValue::Groupings(groupings));
                    continue;
                }
                if value.is_object() {
                    if let Some(grouping) = Self::from_json(value) {
                        params.insert(key, ParamValue::Groupings(vec![grouping]));
                        continue;
                    }
                }
            }
            params.insert(key, ParamValue::Value(Value::from_json(value)));
        }
        Some(params)
    }
}
