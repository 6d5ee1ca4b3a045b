use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path};

const ENV_PREFIX: &str = "NOTES_API_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `sqlite::memory:`, `sqlite://<path>` or `postgres://...`.
    ///
    /// In YAML, quote URLs that end in `:`, e.g. `database_url: "sqlite::memory:"`,
    /// otherwise the trailing colon is read as a mapping indicator.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite://notes.db".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

fn load_from_file(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(Into::into)
}

fn load_from_env() -> Result<Config, envy::Error> {
    envy::prefixed(ENV_PREFIX).from_env::<Config>()
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path = env::var("NOTES_API_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        tracing::info!("Loading configuration from '{}'", config_path);
        return load_from_file(&config_path);
    }

    // Fallback to config.yaml
    if Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return load_from_file("config.yaml");
    }

    // Fallback to environment variables
    tracing::info!(
        "No config file found, loading configuration from {}* environment variables",
        ENV_PREFIX
    );
    load_from_env().map_err(|e| {
        format!(
            "Config file not found and environment variables are invalid. \
             Tried: '{config_path}', 'config.yaml', and environment variables. \
             Error: {e}"
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_in_defaults() {
        let cfg: Config = serde_yaml::from_str("database_url: \"sqlite::memory:\"\n").unwrap();

        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "database_url: postgres://notes@localhost/notes\nbind_addr: 127.0.0.1:9000\nmax_connections: 2\n",
        )
        .unwrap();

        let cfg = load_from_file(path.to_str().unwrap()).unwrap();

        assert_eq!(
            cfg,
            Config {
                database_url: "postgres://notes@localhost/notes".to_string(),
                bind_addr: "127.0.0.1:9000".to_string(),
                max_connections: 2,
            }
        );
    }

    #[test]
    fn prefixed_env_vars_are_read() {
        let cfg: Config = envy::prefixed(ENV_PREFIX)
            .from_iter(vec![
                ("NOTES_API_DATABASE_URL".to_string(), "sqlite://data/notes.db".to_string()),
                ("NOTES_API_MAX_CONNECTIONS".to_string(), "8".to_string()),
                ("UNRELATED".to_string(), "ignored".to_string()),
            ])
            .unwrap();

        assert_eq!(cfg.database_url, "sqlite://data/notes.db");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.max_connections, 8);
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let result = envy::prefixed(ENV_PREFIX).from_iter::<_, Config>(vec![(
            "NOTES_API_MAX_CONNECTIONS".to_string(),
            "many".to_string(),
        )]);

        assert!(result.is_err());
    }

    #[test]
    fn unquoted_memory_url_is_rejected_by_yaml() {
        let result = serde_yaml::from_str::<Config>("database_url: sqlite::memory:\n");
        assert!(result.is_err());
    }
}
