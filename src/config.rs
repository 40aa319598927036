//! Environment-driven configuration.
//!
//! Every value has a default; an environment variable overrides it.
//!
//! ```text
//! Config
//! ├── broker: BrokerConfig      KAFKA_BROKER, KAFKA_TOPIC, KAFKA_PARTITIONS
//! ├── primary: PrimaryConfig    PORT, KAFKA_CLIENT_ID
//! └── consumer: ConsumerConfig  CONSUMER_PORT, KAFKA_GROUP_ID, MY_TINY_APP_API_URL,
//!                               PRIMARY_API_TIMEOUT_MS, CONSUMER_POLL_INTERVAL_MS
//! ```

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker address. Informational for the in-memory broker.
    pub address: String,
    pub topic: String,
    /// Partition count, at least 1.
    pub partitions: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:9092".into(),
            topic: "item-events".into(),
            partitions: 3,
        }
    }
}

/// Primary API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryConfig {
    pub port: u16,
    pub client_id: String,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            client_id: "my-tiny-app-producer".into(),
        }
    }
}

/// Consumer service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    pub port: u16,
    pub group_id: String,
    /// Base URL of the primary API used for verification.
    pub primary_api_url: String,
    /// Bounds verification and health calls to the primary API.
    pub primary_api_timeout: Duration,
    /// Longest a single broker poll waits.
    pub poll_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            group_id: "my-tiny-app-consumer-group".into(),
            primary_api_url: "http://127.0.0.1:3000".into(),
            primary_api_timeout: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub primary: PrimaryConfig,
    pub consumer: ConsumerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env = Env(lookup);

        let partitions = env.parsed("KAFKA_PARTITIONS", defaults.broker.partitions)?;
        if partitions == 0 {
            return Err(ConfigError::Invalid {
                var: "KAFKA_PARTITIONS",
                value: "0".into(),
            });
        }

        Ok(Self {
            broker: BrokerConfig {
                address: env.string("KAFKA_BROKER", defaults.broker.address),
                topic: env.string("KAFKA_TOPIC", defaults.broker.topic),
                partitions,
            },
            primary: PrimaryConfig {
                port: env.parsed("PORT", defaults.primary.port)?,
                client_id: env.string("KAFKA_CLIENT_ID", defaults.primary.client_id),
            },
            consumer: ConsumerConfig {
                port: env.parsed("CONSUMER_PORT", defaults.consumer.port)?,
                group_id: env.string("KAFKA_GROUP_ID", defaults.consumer.group_id),
                primary_api_url: env.string("MY_TINY_APP_API_URL", defaults.consumer.primary_api_url),
                primary_api_timeout: env.millis(
                    "PRIMARY_API_TIMEOUT_MS",
                    defaults.consumer.primary_api_timeout,
                )?,
                poll_interval: env.millis(
                    "CONSUMER_POLL_INTERVAL_MS",
                    defaults.consumer.poll_interval,
                )?,
            },
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, var: &'static str, default: String) -> String {
        (self.0)(var).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    fn parsed<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, ConfigError> {
        match (self.0)(var).filter(|v| !v.is_empty()) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var, value }),
        }
    }

    fn millis(&self, var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let millis = self.parsed(var, default.as_millis() as u64)?;
        if millis == 0 {
            return Err(ConfigError::Invalid {
                var,
                value: "0".into(),
            });
        }
        Ok(Duration::from_millis(millis))
    }
}
