//! Named bundles of methods that can be attached to a single node.
//!
//! A mapping carrying the reserved [`INCLUDE_KEY`](crate::INCLUDE_KEY) entry
//! has its capabilities attached to the node it is wrapped into. The methods
//! are then reachable through [`Node::call`](crate::Node::call) ahead of
//! ordinary key lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::node::Node;
use crate::value::{normalize_key, Value};
use crate::Error;

pub(crate) type Method = Arc<dyn Fn(&Node) -> Result<Value, Error> + Send + Sync>;

/// A named set of methods contributed to the node it is attached to.
///
/// Cloning is cheap; clones compare equal to each other.
///
/// ```
/// use confnode::{Capability, Node, Table, Value, INCLUDE_KEY};
///
/// let urls = Capability::new("urls").method("url", |node| {
///     let host = node.get("host")?;
///     Ok(Value::from(format!("http://{}", host.as_str().unwrap_or("localhost"))))
/// });
///
/// let mut server = Table::new();
/// server.insert("host".into(), "example.com".into());
/// server.insert(INCLUDE_KEY.into(), urls.into());
///
/// let mut data = Table::new();
/// data.insert("server".into(), server.into());
///
/// let node = Node::new(data);
/// let server = node.get("server")?;
/// let server = server.as_node().unwrap();
/// assert_eq!(server.call("url")?, "http://example.com");
/// # Ok::<(), confnode::Error>(())
/// ```
#[derive(Clone)]
pub struct Capability {
    inner: Arc<CapabilityInner>,
}

#[derive(Clone)]
struct CapabilityInner {
    name: String,
    methods: BTreeMap<String, Method>,
}

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(CapabilityInner {
                name: name.into(),
                methods: BTreeMap::new(),
            }),
        }
    }

    /// Adds a method, replacing any previous method with the same name.
    ///
    /// Method names are case-folded like keys.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Node) -> Result<Value, Error> + Send + Sync + 'static,
    {
        let name: String = name.into();
        Arc::make_mut(&mut self.inner)
            .methods
            .insert(normalize_key(&name), Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.inner.methods.keys().map(String::as_str)
    }

    pub fn responds_to(&self, method: &str) -> bool {
        self.inner.methods.contains_key(&normalize_key(method))
    }

    pub(crate) fn method_for(&self, method: &str) -> Option<Method> {
        self.inner.methods.get(&normalize_key(method)).cloned()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.inner.name)
            .field("methods", &self.inner.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Collects the capabilities named by the value of an include entry.
///
/// Accepts a capability list or an array of them; anything else is ignored.
pub(crate) fn from_include(value: Value) -> Vec<Capability> {
    match value {
        Value::Include(caps) => caps,
        Value::Array(items) => items.into_iter().flat_map(from_include).collect(),
        other => {
            tracing::warn!(value = ?other, "ignoring include entry that holds no capabilities");
            Vec::new()
        }
    }
}
