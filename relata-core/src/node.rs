use crate::error::ConvertError;
use crate::value::SqlValue;

/// One entry of an [`AggregateNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// A scalar or array column value.
    Value(SqlValue),
    /// A single nested entity.
    One(Option<Box<AggregateNode>>),
    /// An ordered or unordered collection of nested entities.
    Many(Vec<AggregateNode>),
    /// A map of scalar key to nested entity. Entries preserve insertion
    /// order; keys are unique.
    Map(Vec<(SqlValue, AggregateNode)>),
}

/// The engine's dynamic aggregate tree.
///
/// Each node corresponds to one table row plus the child slots declared by
/// the entity's schema. Entities produce nodes via
/// [`Entity::dehydrate`](crate::Entity::dehydrate) and consume them via
/// [`Entity::hydrate`](crate::Entity::hydrate); the engine itself never sees
/// a user type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateNode {
    entries: Vec<(String, NodeValue)>,
}

impl AggregateNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scalar entry.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.entries.push((name.into(), NodeValue::Value(value.into())));
        self
    }

    /// Append a single-reference entry.
    pub fn one(mut self, name: impl Into<String>, child: Option<AggregateNode>) -> Self {
        self.entries
            .push((name.into(), NodeValue::One(child.map(Box::new))));
        self
    }

    /// Append a collection entry.
    pub fn many(mut self, name: impl Into<String>, children: Vec<AggregateNode>) -> Self {
        self.entries.push((name.into(), NodeValue::Many(children)));
        self
    }

    /// Append a map entry.
    pub fn map(
        mut self,
        name: impl Into<String>,
        entries: Vec<(SqlValue, AggregateNode)>,
    ) -> Self {
        self.entries.push((name.into(), NodeValue::Map(entries)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NodeValue> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Set a scalar entry in place, appending it if absent.
    pub fn set_value(&mut self, name: &str, value: impl Into<SqlValue>) {
        let value = value.into();
        match self.get_mut(name) {
            Some(slot) => *slot = NodeValue::Value(value),
            None => self.entries.push((name.to_string(), NodeValue::Value(value))),
        }
    }

    fn take(&mut self, name: &str) -> Result<NodeValue, ConvertError> {
        let idx = self
            .entries
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ConvertError::MissingProperty {
                property: name.to_string(),
            })?;
        Ok(self.entries.remove(idx).1)
    }

    /// Remove and return a scalar entry.
    pub fn take_value(&mut self, name: &str) -> Result<SqlValue, ConvertError> {
        match self.take(name)? {
            NodeValue::Value(v) => Ok(v),
            _ => Err(ConvertError::KindMismatch {
                property: name.to_string(),
                expected: "scalar",
            }),
        }
    }

    /// Remove and return a single-reference entry.
    pub fn take_one(&mut self, name: &str) -> Result<Option<AggregateNode>, ConvertError> {
        match self.take(name)? {
            NodeValue::One(v) => Ok(v.map(|b| *b)),
            _ => Err(ConvertError::KindMismatch {
                property: name.to_string(),
                expected: "single-reference",
            }),
        }
    }

    /// Remove and return a collection entry.
    pub fn take_many(&mut self, name: &str) -> Result<Vec<AggregateNode>, ConvertError> {
        match self.take(name)? {
            NodeValue::Many(v) => Ok(v),
            _ => Err(ConvertError::KindMismatch {
                property: name.to_string(),
                expected: "collection",
            }),
        }
    }

    /// Remove and return a map entry.
    pub fn take_map(
        &mut self,
        name: &str,
    ) -> Result<Vec<(SqlValue, AggregateNode)>, ConvertError> {
        match self.take(name)? {
            NodeValue::Map(v) => Ok(v),
            _ => Err(ConvertError::KindMismatch {
                property: name.to_string(),
                expected: "map",
            }),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &NodeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
