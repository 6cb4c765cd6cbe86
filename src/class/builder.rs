use super::Class;
use crate::env::{EnvDefaults, EnvNamespace, EnvSource};
use crate::value::{IntoTable, Table};
use crate::Error;

/// Builder for declaring a class in one expression.
///
/// Each `define` call adds a layer to the class definition. A key set by a
/// later layer overrides the same key from an earlier one, the same way
/// repeated [`Class::define`] calls accumulate. Env settings are checked
/// when the class is built.
///
/// ## Example
///
/// ```
/// use confnode::{Class, MockEnv, Table};
///
/// // MockEnv stands in for the process environment
/// let class = Class::builder("App")
///     .define(toml::toml! {
///         [database]
///         host = "localhost"
///         port = 5432
///     })
///     .env_source(MockEnv::from_pairs([("APP_DATABASE_HOST", "db.internal")]))
///     .build()?;
///
/// let node = class.build(Table::new());
/// assert_eq!(node.get_path("database.host")?, "db.internal");
/// assert_eq!(node.get_path("database.port")?, 5432i64);
/// # Ok::<(), confnode::Error>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ClassBuilder {
    name: String,
    parent: Option<Class>,
    layers: Vec<Table>,
    env: Option<EnvDefaults>,
    separator: Option<String>,
}

impl ClassBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            layers: Vec::new(),
            env: None,
            separator: None,
        }
    }

    /// Starts from a snapshot of `parent`, as [`Class::subclass`] does.
    pub fn parent(mut self, parent: &Class) -> Self {
        self.env = parent.env().map(|mut env| {
            env.clear_namespace();
            env
        });
        self.parent = Some(parent.clone());
        self
    }

    /// Adds a layer of defaults.
    pub fn define(mut self, partial: impl IntoTable) -> Self {
        self.layers.push(partial.into_table());
        self
    }

    /// Opts into environment-variable defaults.
    ///
    /// The other `env_*` methods opt in as well.
    pub fn env_defaults(mut self) -> Self {
        self.env_mut();
        self
    }

    pub fn env_namespace(mut self, namespace: impl Into<EnvNamespace>) -> Self {
        self.env_mut().set_namespace(namespace);
        self
    }

    /// An empty separator makes [`build`](Self::build) fail with
    /// [`Error::EmptySeparator`].
    pub fn env_separator(mut self, separator: impl Into<String>) -> Self {
        self.env_mut();
        self.separator = Some(separator.into());
        self
    }

    pub fn env_source(mut self, source: impl EnvSource + 'static) -> Self {
        self.env_mut().set_source(source);
        self
    }

    fn env_mut(&mut self) -> &mut EnvDefaults {
        self.env.get_or_insert_with(EnvDefaults::default)
    }

    pub fn build(self) -> Result<Class, Error> {
        let mut env = self.env;
        if let (Some(env), Some(separator)) = (env.as_mut(), self.separator) {
            env.set_separator(separator)?;
        }

        let class = match &self.parent {
            Some(parent) => parent.subclass(self.name),
            None => Class::new(self.name),
        };

        if let Some(env) = env {
            class.set_env(env);
        }
        for layer in self.layers {
            class.define(layer);
        }
        Ok(class)
    }
}
