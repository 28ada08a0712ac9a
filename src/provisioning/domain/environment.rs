//! The environment contract between the container definition and the CMS.
//!
//! The container service writes these variables; the CMS database
//! configuration reads them back. Both sides use the names below.

use crate::shared::error::StackError;
use crate::shared::security::redact;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DATABASE_CLIENT: &str = "DATABASE_CLIENT";
pub const DATABASE_HOST: &str = "DATABASE_HOST";
pub const DATABASE_PORT: &str = "DATABASE_PORT";
pub const DATABASE_NAME: &str = "DATABASE_NAME";
pub const DATABASE_USERNAME: &str = "DATABASE_USERNAME";
pub const DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const DATABASE_CREDENTIALS: &str = "DATABASE_CREDENTIALS";
pub const DATABASE_SSL: &str = "DATABASE_SSL";
pub const JWT_SECRET: &str = "JWT_SECRET";
pub const APP_KEYS: &str = "APP_KEYS";
pub const API_TOKEN_SALT: &str = "API_TOKEN_SALT";
pub const ADMIN_JWT_SECRET: &str = "ADMIN_JWT_SECRET";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";

/// Port the CMS container listens on
pub const CONTAINER_PORT: u16 = 1337;

/// Port of the Aurora PostgreSQL cluster
pub const DATABASE_PORT_NUMBER: u16 = 5432;

pub const DATABASE_CLIENT_POSTGRES: &str = "postgres";

/// Shape of the generated credentials secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Connection settings as the CMS resolves them at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConnectionConfig {
    pub client: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl: bool,
}

impl DatabaseConnectionConfig {
    /// Resolves the connection from environment variables.
    ///
    /// `DATABASE_CREDENTIALS` is a JSON blob with `username` and `password`;
    /// when it is absent both default to empty strings. `DATABASE_SSL` is on
    /// only for the value `true`.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing, the port is not an
    /// integer, or the credentials are not JSON
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            env.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| {
                    StackError::MissingContext {
                        key: key.to_string(),
                    }
                    .into()
                })
        };

        let credentials = match env.get(DATABASE_CREDENTIALS) {
            Some(raw) => serde_json::from_str::<DatabaseCredentials>(raw).map_err(|e| {
                StackError::InvalidContext {
                    key: DATABASE_CREDENTIALS.to_string(),
                    reason: format!("not a JSON object with username/password: {}", e),
                }
            })?,
            None => DatabaseCredentials::default(),
        };

        let port_raw = required(DATABASE_PORT)?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| StackError::InvalidContext {
                key: DATABASE_PORT.to_string(),
                reason: format!("'{}' is not a port number", port_raw),
            })?;

        let ssl = env.get(DATABASE_SSL).is_some_and(|raw| is_true(raw));

        Ok(Self {
            client: DATABASE_CLIENT_POSTGRES.to_string(),
            host: required(DATABASE_HOST)?,
            port,
            database: required(DATABASE_NAME)?,
            user: credentials.username,
            password: credentials.password,
            ssl,
        })
    }

    /// JSON view with the password masked, for display
    pub fn to_redacted_json(&self) -> serde_json::Value {
        serde_json::json!({
            "client": self.client,
            "connection": {
                "host": self.host,
                "port": self.port,
                "database": self.database,
                "user": self.user,
                "password": redact(&self.password),
                "ssl": self.ssl,
            }
        })
    }
}

/// Only the literal `true` enables a flag; any other value reads as false.
fn is_true(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_env_reads_full_contract() {
        let config = DatabaseConnectionConfig::from_env(&env(&[
            (DATABASE_HOST, "acme.cluster-abc.eu-west-1.rds.amazonaws.com"),
            (DATABASE_PORT, "5432"),
            (DATABASE_NAME, "acme"),
            (DATABASE_CREDENTIALS, r#"{"username":"acme","password":"s3cret"}"#),
            (DATABASE_SSL, "true"),
        ]))
        .unwrap();

        assert_eq!(config.client, "postgres");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "acme");
        assert_eq!(config.user, "acme");
        assert_eq!(config.password, "s3cret");
        assert!(config.ssl);
    }

    #[test]
    fn test_missing_credentials_default_to_empty() {
        let config = DatabaseConnectionConfig::from_env(&env(&[
            (DATABASE_HOST, "db"),
            (DATABASE_PORT, "5432"),
            (DATABASE_NAME, "acme"),
        ]))
        .unwrap();
        assert_eq!(config.user, "");
        assert_eq!(config.password, "");
        assert!(!config.ssl);
    }

    #[test]
    fn test_ssl_flag_is_true_only_for_literal_true() {
        let ssl = |value: &str| {
            DatabaseConnectionConfig::from_env(&env(&[
                (DATABASE_HOST, "db"),
                (DATABASE_PORT, "5432"),
                (DATABASE_NAME, "acme"),
                (DATABASE_SSL, value),
            ]))
            .unwrap()
            .ssl
        };

        assert!(ssl("true"));
        assert!(ssl("TRUE"));
        assert!(!ssl("1"));
        assert!(!ssl("yes"));
        assert!(!ssl("false"));
        assert!(!ssl(""));
    }

    #[test]
    fn test_port_must_be_integer() {
        let err = DatabaseConnectionConfig::from_env(&env(&[
            (DATABASE_HOST, "db"),
            (DATABASE_PORT, "fivefour"),
            (DATABASE_NAME, "acme"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("not a port number"));
    }

    #[test]
    fn test_missing_host_is_reported() {
        let err = DatabaseConnectionConfig::from_env(&env(&[
            (DATABASE_PORT, "5432"),
            (DATABASE_NAME, "acme"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(DATABASE_HOST));
    }

    #[test]
    fn test_credentials_must_be_json() {
        let err = DatabaseConnectionConfig::from_env(&env(&[
            (DATABASE_HOST, "db"),
            (DATABASE_PORT, "5432"),
            (DATABASE_NAME, "acme"),
            (DATABASE_CREDENTIALS, "acme:s3cret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(DATABASE_CREDENTIALS));
    }

    #[test]
    fn test_redacted_json_hides_password() {
        let config = DatabaseConnectionConfig {
            client: "postgres".to_string(),
            host: "db".to_string(),
            port: 5432,
            database: "acme".to_string(),
            user: "acme".to_string(),
            password: "s3cret".to_string(),
            ssl: false,
        };
        let rendered = config.to_redacted_json().to_string();
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted:6 chars>"));
    }
}
