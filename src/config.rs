//! Process configuration, loaded from environment variables.
//!
//! Every key has a default so a local stack (Postgres on 5432, a broker on
//! 9092) works with no environment at all.

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub metrics_port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub group_id: String,
    /// Run the `order.created` logging consumer alongside the service
    pub consume_order_events: bool,
}

impl DatabaseConfig {
    /// Connection URL in the form sqlx expects.
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.ssl_mode
        )
    }
}

impl KafkaConfig {
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let database = DatabaseConfig {
            host: get("DB_HOST", "localhost"),
            port: parse_value("DB_PORT", &get("DB_PORT", "5432"))?,
            user: get("DB_USER", "postgres"),
            password: get("DB_PASSWORD", "postgres"),
            name: get("DB_NAME", "small_ecommers"),
            ssl_mode: get("DB_SSLMODE", "disable"),
            max_connections: parse_value("DB_MAX_CONNECTIONS", &get("DB_MAX_CONNECTIONS", "25"))?,
        };

        let brokers = get("KAFKA_BROKERS", "localhost:9092")
            .split(',')
            .map(str::trim)
            .filter(|broker| !broker.is_empty())
            .map(String::from)
            .collect();

        let kafka = KafkaConfig {
            brokers,
            group_id: get("KAFKA_GROUP_ID", "order-events-logger"),
            consume_order_events: parse_value(
                "ORDER_EVENTS_CONSUMER",
                &get("ORDER_EVENTS_CONSUMER", "true"),
            )?,
        };

        Ok(Self {
            database,
            kafka,
            metrics_port: parse_value("METRICS_PORT", &get("METRICS_PORT", "9090"))?,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("invalid value for {key}: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "small_ecommers");
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.kafka.brokers, vec!["localhost:9092".to_string()]);
        assert!(config.kafka.consume_order_events);
        assert_eq!(config.metrics_port, 9090);
    }

    #[test]
    fn test_connection_url() {
        let config = load(&[("DB_HOST", "db"), ("DB_PASSWORD", "secret"), ("DB_SSLMODE", "require")])
            .unwrap();

        assert_eq!(
            config.database.connection_url(),
            "postgres://postgres:secret@db:5432/small_ecommers?sslmode=require"
        );
    }

    #[test]
    fn test_multiple_brokers() {
        let config = load(&[("KAFKA_BROKERS", "k1:9092, k2:9092,")]).unwrap();

        assert_eq!(config.kafka.brokers, vec!["k1:9092".to_string(), "k2:9092".to_string()]);
        assert_eq!(config.kafka.bootstrap_servers(), "k1:9092,k2:9092");
    }

    #[test]
    fn test_empty_value_falls_back_to_default() {
        let config = load(&[("DB_HOST", "")]).unwrap();
        assert_eq!(config.database.host, "localhost");
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = load(&[("DB_PORT", "fifty")]).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_consumer_can_be_disabled() {
        let config = load(&[("ORDER_EVENTS_CONSUMER", "false")]).unwrap();
        assert!(!config.kafka.consume_order_events);
    }
}
