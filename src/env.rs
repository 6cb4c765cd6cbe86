//! Environment variables as a second layer of class defaults.
//!
//! With a namespace of `APP` and the default `_` separator, the variable
//! `APP_DB_HOST=localhost` becomes `{ db: { host: "localhost" } }`. Values are
//! always strings. The reconstructed mapping overrides the class definition
//! and is itself overridden by instance data.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use heck::ToShoutySnakeCase;
use tracing::{debug, trace};

use crate::merge::{deep_merge, insert_at_path};
use crate::value::{Table, Value};
use crate::Error;

/// Source of environment variables.
///
/// This allows testing without modifying the actual environment.
pub trait EnvSource: Send + Sync + fmt::Debug {
    /// Iterate over all environment variables.
    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_>;
}

/// Environment source that reads from the actual process environment.
///
/// Variables whose name or value is not valid unicode are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        Box::new(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }
}

/// Environment source backed by a map (for testing).
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: BTreeMap<String, String>,
}

impl MockEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.remove(name);
    }
}

impl EnvSource for MockEnv {
    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        Box::new(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

/// One or more namespace prefixes, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvNamespace(Vec<String>);

impl EnvNamespace {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for EnvNamespace {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_uppercase()).collect())
    }
}

impl From<&str> for EnvNamespace {
    fn from(namespace: &str) -> Self {
        std::iter::once(namespace).collect()
    }
}

impl From<String> for EnvNamespace {
    fn from(namespace: String) -> Self {
        std::iter::once(namespace).collect()
    }
}

impl<S: AsRef<str>> From<Vec<S>> for EnvNamespace {
    fn from(namespaces: Vec<S>) -> Self {
        namespaces.into_iter().collect()
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for EnvNamespace {
    fn from(namespaces: [S; N]) -> Self {
        namespaces.into_iter().collect()
    }
}

/// Returns the namespace used when none is set: the class name in
/// SHOUTY_SNAKE_CASE (`Travis::Config` becomes `TRAVIS_CONFIG`).
pub fn default_namespace(class_name: &str) -> String {
    class_name.to_shouty_snake_case()
}

/// Env-defaults settings carried by a class that opted into them.
#[derive(Debug, Clone)]
pub struct EnvDefaults {
    namespace: Option<Vec<String>>,
    separator: String,
    source: Arc<dyn EnvSource>,
}

impl Default for EnvDefaults {
    fn default() -> Self {
        Self {
            namespace: None,
            separator: "_".to_string(),
            source: Arc::new(StdEnv),
        }
    }
}

impl EnvDefaults {
    /// Returns the explicit namespaces, or the default derived from `class_name`.
    pub fn namespace(&self, class_name: &str) -> Vec<String> {
        match &self.namespace {
            Some(namespaces) => namespaces.clone(),
            None => vec![default_namespace(class_name)],
        }
    }

    pub fn set_namespace(&mut self, namespace: impl Into<EnvNamespace>) {
        self.namespace = Some(namespace.into().into_vec());
    }

    pub(crate) fn clear_namespace(&mut self) {
        self.namespace = None;
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Sets the separator between the namespace and path segments.
    ///
    /// An empty separator is rejected and leaves the current one in place.
    pub fn set_separator(&mut self, separator: impl Into<String>) -> Result<(), Error> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(Error::EmptySeparator);
        }
        self.separator = separator;
        Ok(())
    }

    pub fn set_source(&mut self, source: impl EnvSource + 'static) {
        self.source = Arc::new(source);
    }

    /// Reconstructs the nested mapping from all matching variables.
    ///
    /// Later namespaces override earlier ones.
    pub fn read(&self, class_name: &str) -> Table {
        let namespaces = self.namespace(class_name);
        read_env_table(self.source.as_ref(), &namespaces, &self.separator)
    }
}

fn read_env_table(source: &dyn EnvSource, namespaces: &[String], separator: &str) -> Table {
    let mut vars: Vec<(String, String)> = source.vars().collect();
    vars.sort();

    let mut merged = Table::new();
    for namespace in namespaces {
        let prefix = format!("{namespace}{separator}");
        let mut layer = Table::new();

        for (key, value) in &vars {
            let Some(path_str) = key.strip_prefix(&prefix) else {
                continue;
            };

            let path: Vec<String> = path_str
                .split(separator)
                .filter(|segment| !segment.is_empty())
                .map(str::to_lowercase)
                .collect();

            if path.is_empty() {
                trace!(var = %key, "skipping env var without a path");
                continue;
            }

            debug!(var = %key, "applying env default");
            insert_at_path(&mut layer, &path, Value::String(value.clone()));
        }

        deep_merge(&mut merged, layer);
    }
    merged
}
