// src/config.rs
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// JSON catalog loaded at startup when set.
    #[serde(default)]
    pub seed_file: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_cache_capacity() -> u64 {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config = Config::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/cinehub"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.cache_capacity, 1000);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_iter(vars(&[
            ("DATABASE_URL", "postgres://localhost/cinehub"),
            ("JWT_SECRET", "secret"),
            ("PORT", "9000"),
            ("SEED_FILE", "catalog.json"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.seed_file.as_deref(), Some("catalog.json"));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = Config::from_iter(vars(&[("DATABASE_URL", "postgres://localhost/cinehub")]));
        assert!(result.is_err());
    }
}
