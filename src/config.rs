//! Application configuration.
//!
//! Three sources, all producing the same [`Config`]:
//!
//! - [`Config::default()`]: listen on `0.0.0.0:3000`, no database, 1 MiB bodies,
//!   anonymous access allowed.
//! - [`Config::from_json`]: a JSON document; missing fields keep their defaults.
//! - [`Config::from_env`]: a `.env` file (via `dotenvy`) and the process
//!   environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `APIER_LISTEN` | `listen` |
//! | `APIER_DATABASE_URL` | `database_url` |
//! | `APIER_BODY_LIMIT` | `body_limit` (bytes) |
//! | `APIER_REQUIRE_TOKEN` | `access.require_token` |
//! | `APIER_ACCESS_TOKENS` | `access.tokens`, as `token=subject:perm1,perm2;token2=subject2` |

use std::net::SocketAddr;

use serde::Deserialize;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse {key}='{value}': {message}")]
    Parse { key: &'static str, value: String, message: String },

    #[error("invalid config document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Top-level configuration consumed by `App::builder`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    pub database_url: Option<String>,
    pub body_limit: usize,
    pub access: AccessConfig,
}

/// Settings handed to `AccessVerifier::init`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Reject requests that carry no token at all.
    pub require_token: bool,
    pub tokens: Vec<TokenGrant>,
}

/// One bearer token and the identity it stands for.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct TokenGrant {
    pub token: String,
    pub subject: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            body_limit: DEFAULT_BODY_LIMIT,
            access: AccessConfig::default(),
        }
    }
}

impl Config {
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(doc)?)
    }

    /// Loads `.env` if present, then reads the `APIER_*` variables.
    ///
    /// A missing `.env` file is fine; one that cannot be read or parsed is
    /// an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unset variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("APIER_LISTEN") {
            config.listen = parse("APIER_LISTEN", v)?;
        }
        if let Some(v) = lookup("APIER_DATABASE_URL") {
            config.database_url = Some(v).filter(|url| !url.is_empty());
        }
        if let Some(v) = lookup("APIER_BODY_LIMIT") {
            config.body_limit = parse("APIER_BODY_LIMIT", v)?;
        }
        if let Some(v) = lookup("APIER_REQUIRE_TOKEN") {
            config.access.require_token = parse("APIER_REQUIRE_TOKEN", v)?;
        }
        if let Some(v) = lookup("APIER_ACCESS_TOKENS") {
            config.access.tokens = parse_grants(&v)?;
        }
        Ok(config)
    }
}

fn env_file<T>(loaded: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
        key,
        message: e.to_string(),
        value,
    })
}

fn parse_grants(spec: &str) -> Result<Vec<TokenGrant>, ConfigError> {
    spec.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = |message: &str| ConfigError::Parse {
                key: "APIER_ACCESS_TOKENS",
                value: entry.to_owned(),
                message: message.to_owned(),
            };
            let (token, rest) = entry.split_once('=').ok_or_else(|| invalid("expected token=subject"))?;
            let (subject, perms) = rest.split_once(':').unwrap_or((rest, ""));
            if token.trim().is_empty() || subject.trim().is_empty() {
                return Err(invalid("token and subject must not be empty"));
            }
            Ok(TokenGrant {
                token: token.trim().to_owned(),
                subject: subject.trim().to_owned(),
                permissions: perms
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned)
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.listen, SocketAddr::from(([0, 0, 0, 0], 3000)));
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert!(config.database_url.is_none());
        assert!(!config.access.require_token);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("APIER_LISTEN", "127.0.0.1:8080"),
            ("APIER_DATABASE_URL", "postgres://localhost/apier"),
            ("APIER_BODY_LIMIT", "2048"),
            ("APIER_REQUIRE_TOKEN", "true"),
            ("APIER_ACCESS_TOKENS", "abc=alice:admin,read; xyz=bob"),
        ]))
        .unwrap();

        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/apier"));
        assert_eq!(config.body_limit, 2048);
        assert!(config.access.require_token);
        assert_eq!(config.access.tokens, vec![
            TokenGrant { token: "abc".into(), subject: "alice".into(), permissions: vec!["admin".into(), "read".into()] },
            TokenGrant { token: "xyz".into(), subject: "bob".into(), permissions: vec![] },
        ]);
    }

    #[test]
    fn reports_bad_values() {
        let err = Config::from_lookup(lookup(&[("APIER_BODY_LIMIT", "lots")])).unwrap_err();
        assert!(err.to_string().contains("APIER_BODY_LIMIT"));

        let err = Config::from_lookup(lookup(&[("APIER_ACCESS_TOKENS", "no-subject")])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { key: "APIER_ACCESS_TOKENS", .. }));
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let missing = std::env::temp_dir().join("apier-no-such-dir").join(".env");
        assert!(env_file(dotenvy::from_path(missing)).is_ok());
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let path = std::env::temp_dir().join(format!("apier-bad-{}.env", std::process::id()));
        std::fs::write(&path, "THIS LINE IS NOT VALID\n").unwrap();

        let err = env_file(dotenvy::from_path(&path)).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::EnvFile(_)));
    }

    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let config = Config::from_json(r#"{
            "database_url": "mongodb://localhost/app",
            "access": {"tokens": [{"token": "t", "subject": "svc", "permissions": ["admin"]}]}
        }"#)
        .unwrap();

        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert_eq!(config.database_url.as_deref(), Some("mongodb://localhost/app"));
        assert_eq!(config.access.tokens[0].permissions, ["admin"]);
    }
}
