//! Values stored in a node and the mapping type they live in.

use std::collections::BTreeMap;

use toml::value::Datetime;

use crate::capability::Capability;
use crate::node::Node;

/// Reserved key whose value lists the capabilities attached to a nested node.
pub const INCLUDE_KEY: &str = "_include";

/// A mapping of normalized keys to values.
///
/// Sibling order carries no meaning.
pub type Table = BTreeMap<String, Value>;

/// A single value in a node's mapping.
///
/// `Nil` is the absent sentinel returned by lenient lookups of unknown keys.
/// A `Table` is wrapped lazily into a `Node` the first time it is read.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(Datetime),
    Array(Vec<Value>),
    Table(Table),
    Node(Node),
    Include(Vec<Capability>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns whether the value counts as present for a presence query.
    ///
    /// `Nil`, `false` and empty strings, arrays, mappings or capability lists
    /// are not present.
    pub fn is_present(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Table(t) => !t.is_empty(),
            Value::Node(n) => !n.is_empty(),
            Value::Include(caps) => !caps.is_empty(),
            Value::Integer(_) | Value::Float(_) | Value::Datetime(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Returns a plain snapshot of the value if it is mapping-like.
    pub(crate) fn as_mapping(&self) -> Option<Table> {
        match self {
            Value::Table(t) => Some(t.clone()),
            Value::Node(n) => Some(n.to_table()),
            _ => None,
        }
    }

    /// Converts the value to TOML, unwrapping nodes.
    ///
    /// Returns `None` for `Nil` and capability lists, which have no TOML form.
    pub fn to_toml(&self) -> Option<toml::Value> {
        match self {
            Value::Nil | Value::Include(_) => None,
            Value::String(s) => Some(toml::Value::String(s.clone())),
            Value::Integer(i) => Some(toml::Value::Integer(*i)),
            Value::Float(f) => Some(toml::Value::Float(*f)),
            Value::Boolean(b) => Some(toml::Value::Boolean(*b)),
            Value::Datetime(dt) => Some(toml::Value::Datetime(*dt)),
            Value::Array(a) => Some(toml::Value::Array(
                a.iter().filter_map(Value::to_toml).collect(),
            )),
            Value::Table(t) => Some(toml::Value::Table(table_to_toml(t))),
            Value::Node(n) => Some(toml::Value::Table(n.to_toml())),
        }
    }
}

/// Normalizes a key so that differently cased spellings address the same entry.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// Anything that can be turned into a normalized [`Table`].
pub trait IntoTable {
    fn into_table(self) -> Table;
}

impl IntoTable for Table {
    fn into_table(self) -> Table {
        normalize_table(self)
    }
}

impl IntoTable for toml::Table {
    fn into_table(self) -> Table {
        self.into_iter()
            .map(|(key, value)| (normalize_key(&key), Value::from(value)))
            .collect()
    }
}

impl IntoTable for &Node {
    fn into_table(self) -> Table {
        self.to_table()
    }
}

fn normalize_table(table: Table) -> Table {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Table(nested) => Value::Table(normalize_table(nested)),
                other => other,
            };
            (normalize_key(&key), value)
        })
        .collect()
}

pub(crate) fn table_to_toml(table: &Table) -> toml::Table {
    table
        .iter()
        .filter_map(|(key, value)| value.to_toml().map(|v| (key.clone(), v)))
        .collect()
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Boolean(b),
            toml::Value::Datetime(dt) => Value::Datetime(dt),
            toml::Value::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            toml::Value::Table(t) => Value::Table(t.into_table()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Node(n)
    }
}

impl From<Capability> for Value {
    fn from(c: Capability) -> Self {
        Value::Include(vec![c])
    }
}

impl From<Vec<Capability>> for Value {
    fn from(caps: Vec<Capability>) -> Self {
        Value::Include(caps)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_integer() == Some(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_keys_are_normalized() {
        let table = toml::toml! {
            Foo = "foo"
            [Bar]
            BAZ = 1
        }
        .into_table();

        assert_eq!(table["foo"], "foo");
        let bar = table["bar"].as_mapping().unwrap();
        assert_eq!(bar["baz"], 1i64);
    }

    #[test]
    fn test_presence() {
        assert!(!Value::Nil.is_present());
        assert!(!Value::from("").is_present());
        assert!(!Value::from(false).is_present());
        assert!(!Value::Array(vec![]).is_present());
        assert!(!Value::Table(Table::new()).is_present());
        assert!(Value::from("x").is_present());
        assert!(Value::from(0i64).is_present());
        assert!(Value::from(true).is_present());
    }

    #[test]
    fn test_to_toml_drops_nil_and_includes() {
        let mut table = Table::new();
        table.insert("name".into(), "app".into());
        table.insert("gone".into(), Value::Nil);
        table.insert(INCLUDE_KEY.into(), Capability::new("helpers").into());

        let toml = table_to_toml(&table);
        assert_eq!(toml.len(), 1);
        assert_eq!(toml["name"].as_str(), Some("app"));
    }
}
