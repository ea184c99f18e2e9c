use anyhow::Context;
use std::io::Read;

const CONFIG_PATH: &str = "./app-config.toml";

#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bind_address: String,
    pub bind_port: u16,
    pub database: rrhh_db::Config,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Only send the session cookie over HTTPS.
    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TracingConfig {
    #[serde(default)]
    pub console: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            console: false,
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info,rrhh_web=debug".to_owned()
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    let mut configuration = String::with_capacity(4096);
    std::fs::File::open(CONFIG_PATH)
        .with_context(|| format!("unable to open configuration file {CONFIG_PATH}"))?
        .read_to_string(&mut configuration)
        .with_context(|| format!("unable to read configuration file {CONFIG_PATH}"))?;
    let mut config = parse(&configuration)?;
    if let Ok(db_url) = std::env::var("RRHH_DATABASE_URL") {
        config.database.set_db_url(db_url);
    }
    if let Ok(bind_address) = std::env::var("RRHH_BIND_ADDRESS") {
        config.bind_address = bind_address;
    }
    Ok(config)
}

fn parse(configuration: &str) -> anyhow::Result<Config> {
    toml::from_str::<Config>(configuration)
        .with_context(|| format!("unable to parse configuration file {CONFIG_PATH}"))
}
