//! Per-type defaults and the construction of nodes from them.
//!
//! A [`Class`] owns a definition (its accumulated default mapping) and,
//! optionally, [`EnvDefaults`] settings. Building a node merges, from lowest
//! to highest precedence: the definition, the environment layer, and the
//! instance data.

mod builder;
mod registry;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

pub use builder::ClassBuilder;
pub use registry::Registry;

use crate::env::{EnvDefaults, EnvNamespace, EnvSource};
use crate::merge::deep_merge;
use crate::node::{unwrap_value, Node};
use crate::value::{IntoTable, Table};
use crate::Error;

/// A named set of defaults shared by every node built from it.
///
/// `Class` is a handle: clones share the same definition. Use
/// [`subclass`](Self::subclass) for an independent copy.
///
/// ```
/// use confnode::Class;
///
/// let class = Class::new("Server");
/// class.define(toml::toml! {
///     host = "localhost"
///     [tls]
///     enabled = false
/// });
///
/// let node = class.build(toml::toml! { host = "example.com" });
/// assert_eq!(node.get("host")?, "example.com");
/// assert_eq!(node.get_path("tls.enabled")?, false);
/// # Ok::<(), confnode::Error>(())
/// ```
#[derive(Clone)]
pub struct Class {
    inner: Arc<RwLock<ClassState>>,
}

#[derive(Debug, Clone)]
struct ClassState {
    name: String,
    definition: Table,
    env: Option<EnvDefaults>,
}

impl Class {
    /// Creates a class with an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(ClassState {
            name: name.into(),
            definition: Table::new(),
            env: None,
        })
    }

    /// Creates a builder for a class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Returns the class registered for `T` in the global [`Registry`].
    pub fn of<T: ?Sized + 'static>() -> Self {
        Registry::global().class_of::<T>()
    }

    fn from_state(state: ClassState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ClassState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClassState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a subclass starting from a snapshot of this class.
    ///
    /// The definition and env-defaults settings are copied; an explicit env
    /// namespace is not, so the subclass defaults to its own name. Later
    /// changes to either class do not affect the other.
    pub fn subclass(&self, name: impl Into<String>) -> Self {
        let mut state = self.read().clone();
        state.name = name.into();
        if let Some(env) = state.env.as_mut() {
            env.clear_namespace();
        }
        debug!(parent = %self.name(), class = %state.name, "subclassed");
        Self::from_state(state)
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Deep-merges `partial` into the definition. Calls accumulate.
    pub fn define(&self, partial: impl IntoTable) -> &Self {
        let partial: Table = partial
            .into_table()
            .iter()
            .map(|(key, value)| (key.clone(), unwrap_value(value)))
            .collect();

        let mut state = self.write();
        debug!(class = %state.name, keys = ?partial.keys().collect::<Vec<_>>(), "defining defaults");
        deep_merge(&mut state.definition, partial);
        self
    }

    /// Returns a copy of the accumulated definition.
    pub fn definition(&self) -> Table {
        self.read().definition.clone()
    }

    /// Opts into environment-variable defaults. Calling it again has no effect.
    pub fn extend_env_defaults(&self) -> &Self {
        self.write().env.get_or_insert_with(EnvDefaults::default);
        self
    }

    pub fn has_env_defaults(&self) -> bool {
        self.read().env.is_some()
    }

    /// Returns the env namespaces, or `None` without env defaults.
    pub fn env_namespace(&self) -> Option<Vec<String>> {
        let state = self.read();
        state.env.as_ref().map(|env| env.namespace(&state.name))
    }

    pub fn set_env_namespace(&self, namespace: impl Into<EnvNamespace>) -> Result<(), Error> {
        self.with_env(|env| {
            env.set_namespace(namespace);
            Ok(())
        })
    }

    /// Fails with [`Error::EmptySeparator`] for an empty separator.
    pub fn set_env_separator(&self, separator: impl Into<String>) -> Result<(), Error> {
        self.with_env(|env| env.set_separator(separator))
    }

    pub fn set_env_source(&self, source: impl EnvSource + 'static) -> Result<(), Error> {
        self.with_env(|env| {
            env.set_source(source);
            Ok(())
        })
    }

    fn with_env(
        &self,
        f: impl FnOnce(&mut EnvDefaults) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut state = self.write();
        match state.env.as_mut() {
            Some(env) => f(env),
            None => Err(Error::EnvDefaultsDisabled(state.name.clone())),
        }
    }

    pub(crate) fn set_env(&self, env: EnvDefaults) {
        self.write().env = Some(env);
    }

    pub(crate) fn env(&self) -> Option<EnvDefaults> {
        self.read().env.clone()
    }

    /// Returns the definition with the environment layer merged over it.
    pub fn defaults(&self) -> Table {
        let state = self.read();
        let mut defaults = state.definition.clone();
        if let Some(env) = &state.env {
            deep_merge(&mut defaults, env.read(&state.name));
        }
        defaults
    }

    /// Builds a node from `data` merged over this class's defaults.
    pub fn build(&self, data: impl IntoTable) -> Node {
        let mut merged = self.defaults();
        deep_merge(&mut merged, data.into_table());
        debug!(class = %self.name(), keys = merged.len(), "building node");
        Node::wrap(merged)
    }

    /// Returns whether both handles refer to the same class.
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Class")
            .field("name", &state.name)
            .field("definition", &state.definition)
            .field("env", &state.env)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;
    use crate::{Capability, Value, INCLUDE_KEY};

    #[test]
    fn test_defining_defaults() {
        let class = Class::new("Defaults");
        class.define(toml::toml! {
            foo = "foo"
            [bar]
            baz = "baz"
        });

        assert_eq!(class.build(Table::new()).get("foo").unwrap(), "foo");
        assert_eq!(class.build(Table::new()).get_path("bar.baz").unwrap(), "baz");
    }

    #[test]
    fn test_defines_accumulate() {
        let class = Class::new("Accumulate");
        class
            .define(toml::toml! {
                [db]
                host = "localhost"
            })
            .define(toml::toml! {
                [db]
                port = 5432
            });

        let db = class.definition()["db"].as_mapping().unwrap();
        assert_eq!(db["host"], "localhost");
        assert_eq!(db["port"], 5432i64);
    }

    #[test]
    fn test_different_classes_have_independent_definitions() {
        let foo = Class::new("Foo");
        let bar = Class::new("Bar");
        foo.define(toml::toml! { foo = "foo" });
        bar.define(toml::toml! { bar = "bar" });

        assert_eq!(foo.definition()["foo"], "foo");
        assert_eq!(bar.definition()["bar"], "bar");
        assert!(!foo.definition().contains_key("bar"));
        assert!(!bar.definition().contains_key("foo"));
    }

    #[test]
    fn test_subclass_snapshots_parent() {
        let parent = Class::new("Parent");
        parent.define(toml::toml! { shared = "parent" });

        let left = parent.subclass("Left");
        let right = parent.subclass("Right");
        left.define(toml::toml! { left = "left" });
        right.define(toml::toml! { shared = "right" });
        parent.define(toml::toml! { late = "late" });

        assert_eq!(left.definition()["shared"], "parent");
        assert!(!left.definition().contains_key("late"));
        assert!(!right.definition().contains_key("left"));
        assert_eq!(right.definition()["shared"], "right");
        assert_eq!(parent.definition()["shared"], "parent");
    }

    #[test]
    fn test_instance_data_wins_over_definition() {
        let class = Class::new("Instance");
        class.define(toml::toml! {
            [db]
            host = "localhost"
            port = 5432
        });

        let node = class.build(toml::toml! {
            [db]
            host = "db.internal"
        });
        assert_eq!(node.get_path("db.host").unwrap(), "db.internal");
        assert_eq!(node.get_path("db.port").unwrap(), 5432i64);
    }

    #[test]
    fn test_instances_do_not_share_nested_nodes() {
        let class = Class::new("Shared");
        class.define(toml::toml! {
            [db]
            host = "localhost"
        });

        let first = class.build(Table::new());
        let second = class.build(Table::new());
        let db = first.get("db").unwrap();
        db.as_node().unwrap().set("host", "changed");

        assert_eq!(second.get_path("db.host").unwrap(), "localhost");
        assert_eq!(class.definition()["db"].as_mapping().unwrap()["host"], "localhost");
    }

    #[test]
    fn test_env_namespace_requires_env_defaults() {
        let class = Class::new("NoEnv");
        assert_eq!(class.env_namespace(), None);
        assert_eq!(
            class.set_env_namespace("foo"),
            Err(Error::EnvDefaultsDisabled("NoEnv".into()))
        );
    }

    #[test]
    fn test_different_env_namespaces_on_different_classes() {
        let foo = Class::new("Foo");
        let bar = Class::new("Bar");
        foo.extend_env_defaults().set_env_namespace("foo").unwrap();
        bar.extend_env_defaults().set_env_namespace("bar").unwrap();

        assert_eq!(foo.env_namespace(), Some(vec!["FOO".to_string()]));
        assert_eq!(bar.env_namespace(), Some(vec!["BAR".to_string()]));
    }

    #[test]
    fn test_env_namespace_defaults_to_class_name() {
        let class = Class::new("Travis::Config");
        class.extend_env_defaults();
        assert_eq!(class.env_namespace(), Some(vec!["TRAVIS_CONFIG".to_string()]));
    }

    #[test]
    fn test_env_layer_sits_between_definition_and_instance() {
        let class = Class::new("Layered");
        class.define(toml::toml! {
            foo = "foo"
            kept = "kept"
            [bar]
            baz = "baz"
        });
        class.extend_env_defaults();
        class.set_env_namespace("hashr").unwrap();
        class
            .set_env_source(MockEnv::from_pairs([
                ("HASHR_FOO", "env foo"),
                ("HASHR_BAR_BAZ", "env bar baz"),
            ]))
            .unwrap();

        let node = class.build(Table::new());
        assert_eq!(node.get("foo").unwrap(), "env foo");
        assert_eq!(node.get_path("bar.baz").unwrap(), "env bar baz");
        assert_eq!(node.get("kept").unwrap(), "kept");

        let node = class.build(toml::toml! { foo = "instance foo" });
        assert_eq!(node.get("foo").unwrap(), "instance foo");

        // the definition itself is untouched by the env layer
        assert_eq!(class.definition()["foo"], "foo");
    }

    #[test]
    fn test_env_is_read_at_construction() {
        let class = Class::new("Live");
        class.define(toml::toml! { foo = "foo" });
        class.extend_env_defaults();

        let mut env = MockEnv::new();
        env.set("LIVE_FOO", "env foo");
        class.set_env_source(env.clone()).unwrap();
        assert_eq!(class.build(Table::new()).get("foo").unwrap(), "env foo");

        env.remove("LIVE_FOO");
        class.set_env_source(env).unwrap();
        assert_eq!(class.build(Table::new()).get("foo").unwrap(), "foo");
    }

    #[test]
    fn test_empty_env_separator_is_an_error() {
        let class = Class::new("Separator");
        assert_eq!(
            class.set_env_separator(""),
            Err(Error::EnvDefaultsDisabled("Separator".into()))
        );

        class.extend_env_defaults();
        class
            .set_env_source(MockEnv::from_pairs([("SEPARATOR_A_B", "v")]))
            .unwrap();
        assert_eq!(class.set_env_separator(""), Err(Error::EmptySeparator));

        // the previous separator stays in effect
        let node = class.build(Table::new());
        assert_eq!(node.get_path("a.b").unwrap(), "v");
    }

    #[test]
    fn test_subclass_env_namespace_defaults_to_own_name() {
        let parent = Class::new("Parent");
        parent.extend_env_defaults().set_env_namespace("custom").unwrap();
        let child = parent.subclass("Child");

        assert_eq!(parent.env_namespace(), Some(vec!["CUSTOM".to_string()]));
        assert_eq!(child.env_namespace(), Some(vec!["CHILD".to_string()]));
    }

    #[test]
    fn test_include_in_definition_attaches_capability() {
        let helper = Capability::new("helper").method("helper", |_| Ok("helper".into()));
        let mut foo = Table::new();
        foo.insert(INCLUDE_KEY.into(), helper.into());
        let mut definition = Table::new();
        definition.insert("foo".into(), Value::Table(foo));

        let class = Class::new("Included");
        class.define(definition);

        let node = class.build(Table::new());
        let foo = node.get("foo").unwrap();
        assert_eq!(foo.as_node().unwrap().call("helper").unwrap(), "helper");
        assert!(!node.responds_to("helper"));
    }
}
