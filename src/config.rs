//! Configuration manager.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::AppState;
use crate::domain::role::RoleName;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file that exists but cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration in `{path}`: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid `url` entry: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Domain name of current instance. Used as token issuer.
    pub url: String,
    /// Listening socket address.
    pub address: String,
    #[serde(skip_deserializing)]
    pub version: String,
    #[serde(skip)]
    pub(crate) path: PathBuf,
    /// Related to JsonWebToken configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Argon2,
    #[serde(skip_serializing)]
    pub roles: Roles,
    #[serde(skip_serializing)]
    pub reconciliation: Reconciliation,
    #[serde(skip_serializing)]
    pub telemetry: Telemetry,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            url: String::default(),
            address: DEFAULT_ADDRESS.to_owned(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            token: None,
            postgres: None,
            argon2: Argon2::default(),
            roles: Roles::default(),
            reconciliation: Reconciliation::default(),
            telemetry: Telemetry::default(),
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Argon2 {
    /// Memory used while hashing, in KiB.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Json Web Token configuration.
///
/// A shared `secret` selects HS256; PEM keys select ES256.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    pub secret: Option<String>,
    pub key_id: Option<String>,
    pub public_key_pem: Option<String>,
    pub private_key_pem: Option<String>,
    /// Update token audience.
    pub audience: Option<String>,
    /// Token lifetime in seconds. Default is 900.
    pub ttl_secs: Option<u64>,
}

/// Role granting configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Roles {
    /// Role given to every new account.
    pub default: RoleName,
}

impl Default for Roles {
    fn default() -> Self {
        Self {
            default: RoleName::User,
        }
    }
}

/// Background repair of unlinked accounts.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Reconciliation {
    /// Seconds between two sweeps. `0` disables the sweep.
    pub interval_secs: u64,
    /// Accounts younger than this are left to their in-flight sign-up.
    pub grace_secs: u64,
    /// Linking attempts made during sign-up.
    pub link_attempts: u32,
    /// Records inspected per sweep.
    pub batch_size: usize,
}

impl Default for Reconciliation {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            grace_secs: 30,
            link_attempts: 3,
            batch_size: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    /// OTLP/gRPC collector. Logs and traces stay local when unset.
    pub otlp_endpoint: Option<String>,
    /// Expose `/metrics`.
    pub prometheus: bool,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            prometheus: true,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    ///
    /// A missing file falls back to defaults. A file that cannot be read or
    /// parsed is an error.
    pub fn read(self) -> Result<Arc<Self>, ConfigError> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config: Self = match File::open(&file_path) {
            Ok(file) => serde_yaml::from_reader(file).map_err(|source| {
                ConfigError::Parse {
                    path: file_path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::error!(path = %file_path.display(), "configuration file not found, using defaults");
                Self::default()
            },
            Err(source) => {
                return Err(ConfigError::Io {
                    path: file_path,
                    source,
                });
            },
        };

        // set app version.
        config.version = VERSION.to_owned();

        // normalize URLs.
        if !config.url.is_empty() {
            config.url = self.normalize_url(&config.url)?;
        }

        Ok(Arc::new(config.with_env()))
    }

    /// Override secrets with environment variables.
    fn with_env(self) -> Self {
        self.with_secrets(
            std::env::var("TOKEN_SECRET").ok(),
            std::env::var("POSTGRES_PASSWORD").ok(),
        )
    }

    fn with_secrets(
        mut self,
        token_secret: Option<String>,
        postgres_password: Option<String>,
    ) -> Self {
        if let Some(secret) = token_secret.filter(|s| !s.is_empty()) {
            self.token.get_or_insert_with(Token::default).secret = Some(secret);
        }

        if let (Some(postgres), Some(password)) =
            (self.postgres.as_mut(), postgres_password)
        {
            postgres.password = Some(password);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Configuration = serde_yaml::from_str("name: auth").unwrap();

        assert_eq!(config.name, "auth");
        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.argon2, Argon2::default());
        assert_eq!(config.roles.default, RoleName::User);
        assert_eq!(config.reconciliation.interval_secs, 60);
        assert_eq!(config.reconciliation.link_attempts, 3);
        assert!(config.telemetry.prometheus);
        assert!(config.postgres.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_sections() {
        let config: Configuration = serde_yaml::from_str(
            r#"
url: auth.example.com
postgres:
  address: localhost:5432
  pool_size: 4
token:
  secret: s3cr3t
  ttl_secs: 60
roles:
  default: ADMIN
reconciliation:
  interval_secs: 0
"#,
        )
        .unwrap();

        let postgres = config.postgres.unwrap();
        assert_eq!(postgres.address, "localhost:5432");
        assert_eq!(postgres.pool_size, Some(4));
        let token = config.token.unwrap();
        assert_eq!(token.secret.as_deref(), Some("s3cr3t"));
        assert_eq!(token.ttl_secs, Some(60));
        assert_eq!(config.roles.default, RoleName::Admin);
        assert_eq!(config.reconciliation.interval_secs, 0);
        assert_eq!(config.reconciliation.grace_secs, 30);
    }

    #[test]
    fn test_normalize_url() {
        let config = Configuration::default();

        assert_eq!(
            config.normalize_url("auth.example.com").unwrap(),
            "https://auth.example.com/"
        );
        assert_eq!(
            config.normalize_url("http://localhost:8080").unwrap(),
            "http://localhost:8080/"
        );
        assert!(config.normalize_url("https://").is_err());
    }

    #[test]
    fn test_secrets_override() {
        let config = Configuration {
            postgres: Some(Postgres::default()),
            ..Default::default()
        }
        .with_secrets(Some("env-secret".into()), Some("pg".into()));

        assert_eq!(
            config.token.and_then(|t| t.secret).as_deref(),
            Some("env-secret")
        );
        assert_eq!(
            config.postgres.and_then(|p| p.password).as_deref(),
            Some("pg")
        );

        let config = Configuration::default().with_secrets(None, Some("pg".into()));
        assert!(config.token.is_none());
        assert!(config.postgres.is_none());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Configuration::default()
            .path(PathBuf::from("does/not/exist.yaml"))
            .read()
            .unwrap();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.version, VERSION);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let path = std::env::temp_dir()
            .join(format!("account-auth-{}-invalid.yaml", std::process::id()));
        std::fs::write(&path, "postgres:\n  address: localhost\nroles:\n  default: user\n").unwrap();

        let result = Configuration::default().path(path.clone()).read();
        std::fs::remove_file(&path).unwrap();

        match result {
            Err(ConfigError::Parse { path: reported, .. }) => {
                assert_eq!(reported, path)
            },
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
