//! Nested mappings with attribute-style access, per-type defaults and
//! environment-variable overrides.
//!
//! ```
//! use confnode::{Class, MockEnv, Table};
//!
//! let class = Class::new("App");
//! class.define(toml::toml! {
//!     name = "app"
//!     [server]
//!     host = "localhost"
//! });
//! class.extend_env_defaults();
//! class.set_env_source(MockEnv::from_pairs([("APP_SERVER_HOST", "0.0.0.0")]))?;
//!
//! let config = class.build(Table::new());
//! assert_eq!(config.get("name")?, "app");
//! assert_eq!(config.get_path("server.host")?, "0.0.0.0");
//! # Ok::<(), confnode::Error>(())
//! ```

pub mod capability;
pub mod class;
pub mod env;
mod error;
pub mod merge;
mod missing;
pub mod node;
pub mod value;

pub use capability::Capability;
pub use class::{Class, ClassBuilder, Registry};
pub use env::{EnvDefaults, EnvNamespace, EnvSource, MockEnv, StdEnv};
pub use error::Error;
pub use merge::merge;
pub use missing::{raise_missing_keys, set_raise_missing_keys};
pub use node::Node;
pub use value::{normalize_key, IntoTable, Table, Value, INCLUDE_KEY};
