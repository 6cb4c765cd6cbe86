//! Attribute-style access over a nested mapping.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::capability::{self, Capability, Method};
use crate::missing::raise_missing_keys;
use crate::value::{normalize_key, table_to_toml, IntoTable, Table, Value, INCLUDE_KEY};
use crate::Error;

/// A mapping whose entries are read and written by name.
///
/// Nested mappings are wrapped into child nodes the first time they are read,
/// and the child replaces the plain mapping in place, so repeated reads return
/// the same node and writes through the child are visible from the parent.
///
/// `Node` is a handle: clones share the same underlying mapping.
///
/// ```
/// use confnode::Node;
///
/// let node = Node::new(toml::toml! {
///     [server]
///     host = "localhost"
/// });
///
/// let server = node.get("server")?;
/// let server = server.as_node().unwrap();
/// assert_eq!(server.get("host")?, "localhost");
/// assert!(server.query("host"));
/// assert!(!server.query("port"));
///
/// server.set("port", 8080i64);
/// assert_eq!(node.get_path("server.port")?, 8080i64);
/// # Ok::<(), confnode::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Node {
    inner: Arc<RwLock<NodeState>>,
}

#[derive(Default)]
struct NodeState {
    table: Table,
    capabilities: Vec<Capability>,
}

impl Node {
    /// Wraps a mapping without any class defaults.
    pub fn new(data: impl IntoTable) -> Self {
        Self::wrap(data.into_table())
    }

    /// Wraps an already normalized mapping, attaching the capabilities listed
    /// under the include key.
    pub(crate) fn wrap(mut table: Table) -> Self {
        let capabilities = table
            .remove(INCLUDE_KEY)
            .map(capability::from_include)
            .unwrap_or_default();

        if !capabilities.is_empty() {
            trace!(
                capabilities = ?capabilities.iter().map(Capability::name).collect::<Vec<_>>(),
                "attaching capabilities"
            );
        }

        Self {
            inner: Arc::new(RwLock::new(NodeState {
                table,
                capabilities,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the value stored under `key`.
    ///
    /// Unknown keys yield [`Value::Nil`], or [`Error::MissingKey`] when
    /// [`raise_missing_keys`](crate::raise_missing_keys) is on.
    pub fn get(&self, key: &str) -> Result<Value, Error> {
        let key = normalize_key(key);
        match self.lookup(&key) {
            Some(value) => Ok(value),
            None if raise_missing_keys() => {
                debug!(key = %key, "missing key");
                Err(Error::MissingKey(key))
            }
            None => Ok(Value::Nil),
        }
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        if key == INCLUDE_KEY {
            return None;
        }

        let mut state = self.write();
        let entry = state.table.get_mut(key)?;
        if let Value::Table(table) = &mut *entry {
            let child = Node::wrap(std::mem::take(table));
            trace!(key, "wrapped nested mapping");
            *entry = Value::Node(child);
        }
        Some(entry.clone())
    }

    /// Stores `value` under `key` as given.
    ///
    /// Mappings are wrapped on the next read. Setting the include key attaches
    /// the listed capabilities to this node instead of storing an entry.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let key = normalize_key(key);
        let value = match value.into() {
            Value::Table(table) => Value::Table(table.into_table()),
            other => other,
        };

        if key == INCLUDE_KEY {
            self.write()
                .capabilities
                .extend(capability::from_include(value));
            return;
        }

        self.write().table.insert(key, value);
    }

    /// Returns whether `key` holds a present value. Never fails.
    pub fn query(&self, key: &str) -> bool {
        let key = normalize_key(key);
        if key == INCLUDE_KEY {
            return false;
        }
        self.read().table.get(&key).is_some_and(Value::is_present)
    }

    /// Walks a dotted path such as `"server.tls.cert"` through nested nodes.
    pub fn get_path(&self, path: &str) -> Result<Value, Error> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let mut current = self.clone();

        let Some(mut segment) = segments.next() else {
            return Ok(Value::Node(current));
        };

        loop {
            let value = current.get(segment)?;
            let Some(next) = segments.next() else {
                return Ok(value);
            };

            match value {
                Value::Node(node) => current = node,
                _ if raise_missing_keys() => {
                    return Err(Error::MissingKey(normalize_key(path)));
                }
                _ => return Ok(Value::Nil),
            }
            segment = next;
        }
    }

    /// Resolves `name` against the attached capabilities first, then against
    /// the stored keys.
    ///
    /// When nothing matches, yields [`Value::Nil`] or, in strict mode,
    /// [`Error::UndefinedMethod`].
    pub fn call(&self, name: &str) -> Result<Value, Error> {
        if let Some(method) = self.capability_method(name) {
            return method(self);
        }

        match self.lookup(&normalize_key(name)) {
            Some(value) => Ok(value),
            None if raise_missing_keys() => Err(Error::UndefinedMethod(name.to_string())),
            None => Ok(Value::Nil),
        }
    }

    /// Returns whether [`call`](Self::call) would find `name` without falling
    /// through to the missing-key path.
    pub fn responds_to(&self, name: &str) -> bool {
        self.capability_method(name).is_some() || self.contains_key(name)
    }

    /// The most recently attached capability wins when several define `name`.
    fn capability_method(&self, name: &str) -> Option<Method> {
        self.read()
            .capabilities
            .iter()
            .rev()
            .find_map(|cap| cap.method_for(name))
    }

    /// Attaches a capability to this node only.
    pub fn include(&self, capability: Capability) {
        self.write().capabilities.push(capability);
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.read().capabilities.clone()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().table.contains_key(&normalize_key(key))
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().table.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().table.is_empty()
    }

    /// Returns whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Unwraps the node tree into a plain mapping.
    ///
    /// Attached capabilities are written back under the include key so the
    /// result wraps into an equivalent node.
    pub fn to_table(&self) -> Table {
        let state = self.read();
        let mut table: Table = state
            .table
            .iter()
            .map(|(key, value)| (key.clone(), unwrap_value(value)))
            .collect();

        if !state.capabilities.is_empty() {
            table.insert(
                INCLUDE_KEY.to_string(),
                Value::Include(state.capabilities.clone()),
            );
        }
        table
    }

    /// Unwraps the node tree into TOML, dropping `Nil` entries and capabilities.
    pub fn to_toml(&self) -> toml::Table {
        table_to_toml(&self.read().table)
    }
}

pub(crate) fn unwrap_value(value: &Value) -> Value {
    match value {
        Value::Node(node) => Value::Table(node.to_table()),
        Value::Array(items) => Value::Array(items.iter().map(unwrap_value).collect()),
        Value::Table(table) => Value::Table(
            table
                .iter()
                .map(|(key, value)| (key.clone(), unwrap_value(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Node")
            .field("table", &state.table)
            .field(
                "capabilities",
                &state.capabilities.iter().map(Capability::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.to_table() == other.to_table()
    }
}
