//! Env defaults read from the real process environment.
//!
//! Each test uses its own namespace so the tests can run in parallel.

use confnode::{Class, Table};

#[test]
fn test_defaults_to_env_vars() {
    let class = Class::new("EnvDefaultsTest");
    class.extend_env_defaults();
    class.set_env_namespace("hashr").unwrap();
    class.define(toml::toml! {
        foo = "foo"
        [bar]
        baz = "baz"
    });

    std::env::set_var("HASHR_FOO", "env foo");
    std::env::set_var("HASHR_BAR_BAZ", "env bar baz");

    let node = class.build(Table::new());
    assert_eq!(node.get("foo").unwrap(), "env foo");
    let bar = node.get("bar").unwrap();
    assert_eq!(bar.as_node().unwrap().get("baz").unwrap(), "env bar baz");
}

#[test]
fn test_instance_data_wins_over_env_vars() {
    let class = Class::new("Precedence");
    class.extend_env_defaults();
    class.define(toml::toml! { name = "default" });

    std::env::set_var("PRECEDENCE_NAME", "env");

    assert_eq!(class.build(Table::new()).get("name").unwrap(), "env");
    let node = class.build(toml::toml! { name = "instance" });
    assert_eq!(node.get("name").unwrap(), "instance");
}

#[test]
fn test_removed_env_vars_stop_applying() {
    let class = Class::new("Removed");
    class.extend_env_defaults();
    class.define(toml::toml! { name = "default" });

    std::env::set_var("REMOVED_NAME", "env");
    assert_eq!(class.build(Table::new()).get("name").unwrap(), "env");

    std::env::remove_var("REMOVED_NAME");
    assert_eq!(class.build(Table::new()).get("name").unwrap(), "default");
}

#[test]
fn test_multiple_namespaces() {
    let class = Class::new("Multi");
    class.extend_env_defaults();
    class.set_env_namespace(["multi_base", "multi_local"]).unwrap();

    std::env::set_var("MULTI_BASE_HOST", "base");
    std::env::set_var("MULTI_BASE_PORT", "1");
    std::env::set_var("MULTI_LOCAL_HOST", "local");

    let node = class.build(Table::new());
    assert_eq!(node.get("host").unwrap(), "local");
    assert_eq!(node.get("port").unwrap(), "1");
}
