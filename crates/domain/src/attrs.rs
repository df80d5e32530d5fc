//! Attribute values handed to the object renderer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{FlushThreshold, Host, Interval, Port, SecretString, TagTemplate};

/// One attribute value in the renderer's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Integer(u64),
    Boolean(bool),
    /// Icinga 2 duration literal, rendered unquoted.
    Interval(String),
    Secret(SecretString),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn is_secret(&self) -> bool {
        match self {
            Self::Secret(_) => true,
            Self::Map(entries) => entries.values().any(AttrValue::is_secret),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::Interval(value) => Some(value),
            _ => None,
        }
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<SecretString> for AttrValue {
    fn from(value: SecretString) -> Self {
        Self::Secret(value)
    }
}

impl From<Host> for AttrValue {
    fn from(value: Host) -> Self {
        Self::String(value.into())
    }
}

impl From<Port> for AttrValue {
    fn from(value: Port) -> Self {
        Self::Integer(u64::from(value.get()))
    }
}

impl From<Interval> for AttrValue {
    fn from(value: Interval) -> Self {
        Self::Interval(value.into())
    }
}

impl From<FlushThreshold> for AttrValue {
    fn from(value: FlushThreshold) -> Self {
        Self::Integer(value.get())
    }
}

impl From<TagTemplate> for AttrValue {
    fn from(value: TagTemplate) -> Self {
        let tags = value
            .tags
            .into_iter()
            .map(|(name, expr)| (name, AttrValue::String(expr)))
            .collect();
        Self::Map(BTreeMap::from([
            ("measurement".to_owned(), AttrValue::String(value.measurement)),
            ("tags".to_owned(), AttrValue::Map(tags)),
        ]))
    }
}

/// Attribute names paired with possibly-unset values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeGroup {
    entries: Vec<(&'static str, Option<AttrValue>)>,
}

impl AttributeGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V: Into<AttrValue>>(mut self, key: &'static str, value: Option<V>) -> Self {
        self.entries.push((key, value.map(Into::into)));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn get(&self, key: &str) -> Option<&Option<AttrValue>> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `other`. The two groups must not share keys.
    pub fn union(mut self, other: AttributeGroup) -> Self {
        debug_assert!(
            other.keys().all(|key| self.get(key).is_none()),
            "attribute groups overlap"
        );
        self.entries.extend(other.entries);
        self
    }
}

/// Final attribute mapping plus the preserved declaration order of the base
/// group. The order list is never filtered; the renderer uses it for layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedAttributes {
    values: BTreeMap<String, AttrValue>,
    order: Vec<String>,
}

impl RenderedAttributes {
    /// Drops every unset entry of `group` and records `order` verbatim.
    pub fn compact(group: AttributeGroup, order: Vec<String>) -> Self {
        let values = group
            .entries
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key.to_owned(), value)))
            .collect();
        Self { values, order }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_secret(&self) -> bool {
        self.values.values().any(AttrValue::is_secret)
    }

    /// Attributes in presentation order: keys named by the order list first,
    /// then everything else sorted by name.
    pub fn layout(&self) -> Vec<(&str, &AttrValue)> {
        let mut laid_out: Vec<(&str, &AttrValue)> = self
            .order
            .iter()
            .filter_map(|key| self.values.get_key_value(key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        laid_out.extend(
            self.values
                .iter()
                .filter(|(key, _)| !self.order.iter().any(|ordered| ordered == *key))
                .map(|(key, value)| (key.as_str(), value)),
        );
        laid_out
    }
}
