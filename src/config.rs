use std::env;
use std::fmt;

use crate::auth::token::DEFAULT_TOKEN_TTL_HOURS;
use crate::events::MAX_EVENT_BUS_CAPACITY;

/// Upper bound for `TOKEN_TTL_HOURS`: ten years.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Deployment environment. Controls whether internal error causes reach clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Credentials for an Admin account created at startup when absent.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub environment: Environment,
    pub event_bus_capacity: usize,
    /// Honour the `role` field of `POST /register`. Off by default.
    pub allow_role_on_register: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = non_empty_var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_hours = parse_var("TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours)
            || chrono::Duration::try_hours(token_ttl_hours).is_none()
        {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        let bcrypt_cost = parse_var("BCRYPT_COST", 10u32)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let environment = match env::var("APP_ENV") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "development" | "dev" => Environment::Development,
                "production" | "prod" => Environment::Production,
                _ => return Err(ConfigError::Invalid { key: "APP_ENV", value }),
            },
            Err(_) => Environment::Production,
        };

        let event_bus_capacity = parse_var("EVENT_BUS_CAPACITY", 256usize)?;
        if !(1..=MAX_EVENT_BUS_CAPACITY).contains(&event_bus_capacity) {
            return Err(ConfigError::Invalid {
                key: "EVENT_BUS_CAPACITY",
                value: event_bus_capacity.to_string(),
            });
        }

        let bootstrap_admin = match (
            non_empty_var("BOOTSTRAP_ADMIN_EMAIL"),
            non_empty_var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                name: non_empty_var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            server_port: parse_var("SERVER_PORT", 8080u16)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            environment,
            event_bus_capacity,
            allow_role_on_register: parse_var("ALLOW_ROLE_ON_REGISTER", false)?,
            bootstrap_admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.token_ttl_hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;
    use std::sync::Mutex;

    lazy_static! {
        static ref ENV_LOCK: Mutex<()> = Mutex::new(());
    }

    const KEYS: &[&str] = &[
        "DATABASE_URL",
        "SERVER_PORT",
        "SERVER_HOST",
        "JWT_SECRET",
        "TOKEN_TTL_HOURS",
        "BCRYPT_COST",
        "APP_ENV",
        "EVENT_BUS_CAPACITY",
        "ALLOW_ROLE_ON_REGISTER",
        "BOOTSTRAP_ADMIN_EMAIL",
        "BOOTSTRAP_ADMIN_PASSWORD",
        "BOOTSTRAP_ADMIN_NAME",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("JWT_SECRET", "secret");

        let config = Config::from_env().unwrap();

        assert!(config.database_url.is_none());
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.allow_role_on_register);
        assert!(config.bootstrap_admin.is_none());

        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("APP_ENV", "development");
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("BOOTSTRAP_ADMIN_EMAIL", "root@example.com");
        env::set_var("BOOTSTRAP_ADMIN_PASSWORD", "changeme");

        let config = Config::from_env().unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database_url.as_deref(), Some("postgres://test"));
        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.name, "Administrator");
        assert_eq!(admin.email, "root@example.com");

        clear_env();
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        assert!(matches!(Config::from_env(), Err(ConfigError::Missing("JWT_SECRET"))));

        env::set_var("JWT_SECRET", "secret");
        env::set_var("BCRYPT_COST", "2");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "BCRYPT_COST", .. })
        ));

        env::remove_var("BCRYPT_COST");
        env::set_var("SERVER_PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "SERVER_PORT", .. })
        ));

        env::remove_var("SERVER_PORT");
        clear_env();
    }

    #[test]
    fn test_config_rejects_out_of_range_sizes() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("JWT_SECRET", "secret");

        for ttl in ["0", "-5", "87601", "3000000000000"] {
            env::set_var("TOKEN_TTL_HOURS", ttl);
            assert!(
                matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid { key: "TOKEN_TTL_HOURS", .. })
                ),
                "TOKEN_TTL_HOURS={} was accepted",
                ttl
            );
        }

        env::set_var("TOKEN_TTL_HOURS", "87600");
        let config = Config::from_env().unwrap();
        assert_eq!(config.token_ttl(), chrono::Duration::hours(MAX_TOKEN_TTL_HOURS));
        env::remove_var("TOKEN_TTL_HOURS");

        for capacity in ["0", "65537", "9223372036854775807"] {
            env::set_var("EVENT_BUS_CAPACITY", capacity);
            assert!(
                matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid { key: "EVENT_BUS_CAPACITY", .. })
                ),
                "EVENT_BUS_CAPACITY={} was accepted",
                capacity
            );
        }

        clear_env();
    }
}
