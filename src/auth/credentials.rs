use crate::error::Error;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub trait CredentialManager: Send + Sync {
    fn get(&self, key: &str) -> Result<String, Error>;
}

/// Where a single secret comes from. Written in YAML as a one-key map:
/// `{ value: ... }`, `{ env: VAR }` or `{ file: /path }`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(try_from = "SecretSource")]
pub enum Secret {
    Value(String),
    Env(String),
    File(PathBuf),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretSource {
    value: Option<String>,
    env: Option<String>,
    file: Option<PathBuf>,
}

impl TryFrom<SecretSource> for Secret {
    type Error = String;

    fn try_from(source: SecretSource) -> Result<Self, Self::Error> {
        match (source.value, source.env, source.file) {
            (Some(value), None, None) => Ok(Secret::Value(value)),
            (None, Some(var), None) => Ok(Secret::Env(var)),
            (None, None, Some(path)) => Ok(Secret::File(path)),
            _ => Err("a secret needs exactly one of value, env or file".to_string()),
        }
    }
}

impl Secret {
    fn resolve(&self) -> Result<String, Error> {
        match self {
            Secret::Value(v) => Ok(v.clone()),
            Secret::Env(var) => std::env::var(var)
                .map_err(|e| Error::CredentialError(format!("{var}: {e}"))),
            Secret::File(path) => std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| Error::CredentialError(format!("{}: {e}", path.display()))),
        }
    }
}

/// Credentials configured on a zone.
pub struct ZoneCredentials {
    zone: String,
    secrets: HashMap<String, Secret>,
}

impl ZoneCredentials {
    pub fn new(zone: &str, secrets: HashMap<String, Secret>) -> Self {
        Self {
            zone: zone.to_string(),
            secrets,
        }
    }
}

impl CredentialManager for ZoneCredentials {
    fn get(&self, key: &str) -> Result<String, Error> {
        let secret = self.secrets.get(key).ok_or_else(|| {
            Error::CredentialError(format!("zone {} has no credential '{key}'", self.zone))
        })?;
        let value = secret.resolve()?;
        if value.is_empty() {
            return Err(Error::CredentialError(format!(
                "credential '{key}' for zone {} is empty",
                self.zone
            )));
        }
        Ok(value)
    }
}
