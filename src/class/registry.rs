//! One [`Class`] per Rust type.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use tracing::debug;

use super::Class;

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Maps Rust types to their classes.
///
/// The process-wide instance behind [`Class::of`] starts empty and is never
/// torn down. Separate registries are independent of each other.
///
/// ```
/// use confnode::Registry;
///
/// struct Settings;
///
/// let registry = Registry::new();
/// registry.class_of::<Settings>().define(toml::toml! { debug = false });
///
/// assert_eq!(registry.class_of::<Settings>().name(), "Settings");
/// assert_eq!(registry.class_of::<Settings>().definition()["debug"], false);
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    classes: RwLock<HashMap<TypeId, Class>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Returns the class for `T`, creating an empty one named after `T`.
    pub fn class_of<T: ?Sized + 'static>(&self) -> Class {
        if let Some(class) = self.get::<T>() {
            return class;
        }
        self.insert_with::<T>(|| Class::new(short_type_name::<T>()))
    }

    /// Returns the class for `T`, creating it as a subclass of `P`'s class.
    ///
    /// Has no effect on an existing class for `T`.
    pub fn subclass_of<T: ?Sized + 'static, P: ?Sized + 'static>(&self) -> Class {
        if let Some(class) = self.get::<T>() {
            return class;
        }
        let parent = self.class_of::<P>();
        self.insert_with::<T>(|| parent.subclass(short_type_name::<T>()))
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    fn get<T: ?Sized + 'static>(&self) -> Option<Class> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .cloned()
    }

    fn insert_with<T: ?Sized + 'static>(&self, f: impl FnOnce() -> Class) -> Class {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        classes
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                debug!(ty = type_name::<T>(), "registering class");
                f()
            })
            .clone()
    }
}

/// `my_crate::config::Settings<u8>` becomes `Settings`.
fn short_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
