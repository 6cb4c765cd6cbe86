use confnode::{Capability, Class, Table, Value, INCLUDE_KEY};

struct AppConfig;

fn main() -> Result<(), confnode::Error> {
    let urls = Capability::new("urls").method("url", |db| {
        let host = db.get("host")?;
        let port = db.get("port")?;
        Ok(Value::from(format!(
            "postgres://{}:{}",
            host.as_str().unwrap_or("localhost"),
            port.as_integer().or_else(|| port.as_str()?.parse().ok()).unwrap_or(5432),
        )))
    });

    let mut database = Table::new();
    database.insert(INCLUDE_KEY.into(), urls.into());
    let mut includes = Table::new();
    includes.insert("database".into(), database.into());

    // Try APP_CONFIG_DATABASE_HOST=db.internal
    let class = Class::of::<AppConfig>();
    class
        .define(toml::toml! {
            [app]
            name = "demo"
            debug = false

            [database]
            host = "localhost"
            port = 5432
        })
        .define(includes)
        .extend_env_defaults();

    let config = class.build(toml::toml! {
        [app]
        debug = true
    });

    let app = config.get("app")?;
    let app = app.as_node().expect("app is a table");
    println!(
        "App: {} (debug={})",
        app.get("name")?.as_str().unwrap_or_default(),
        app.query("debug")
    );

    let database = config.get("database")?;
    let database = database.as_node().expect("database is a table");
    println!("Database URL: {}", database.call("url")?.as_str().unwrap_or_default());

    Ok(())
}
