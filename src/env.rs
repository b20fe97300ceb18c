//! Minimal `.env` support.
//!
//! Parsing is a pure function ([`parse_env`]); the result is merged into an
//! explicit [`Environment`] table, and only [`apply_to_process_env`] touches
//! the real process environment.
//!
//! Format: one `KEY=VALUE` per line.  Blank lines and lines starting with
//! `#` are ignored; the value is everything after the first `=`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{AuthError, AuthResult};

/// File read by [`Environment::load_default_file`] and
/// [`load_dotenv_to_process`] when no path is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// An explicit key/value table standing in for the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Insert unless the key already exists.  Returns whether it was inserted.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.vars.contains_key(&key) {
            return false;
        }
        self.vars.insert(key, value.into());
        true
    }

    /// Merge parsed pairs; existing keys win.
    pub fn merge(&mut self, pairs: impl IntoIterator<Item = (String, String)>) -> usize {
        let mut added = 0;
        for (key, value) in pairs {
            if self.set_if_absent(key, value) {
                added += 1;
            }
        }
        added
    }

    /// Read and merge an env file.  Returns the number of keys added.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> AuthResult<usize> {
        let text = read_env_file(path.as_ref())?;
        let added = self.merge(parse_env(&text));
        tracing::debug!(path = %path.as_ref().display(), added, "loaded env file");
        Ok(added)
    }

    pub fn load_default_file(&mut self) -> AuthResult<usize> {
        self.load_file(DEFAULT_ENV_FILE)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse env-file text into ordered `(key, value)` pairs.
///
/// Keys and values are trimmed and one level of matching quotes is removed
/// from the value.  Lines without `=` or with an empty key are skipped.
pub fn parse_env(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            tracing::warn!(line = idx + 1, "skipping env line without '='");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            tracing::warn!(line = idx + 1, "skipping env line with empty key");
            continue;
        }
        pairs.push((key.to_owned(), unquote(value.trim()).to_owned()));
    }
    pairs
}

/// Export pairs into the process environment without overwriting keys that
/// are already set.  Returns the number of keys written.
pub fn apply_to_process_env(pairs: &[(String, String)]) -> usize {
    let mut written = 0;
    for (key, value) in pairs {
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
            written += 1;
        }
    }
    written
}

/// Read `path` (or `.env`) and export its pairs into the process environment.
pub fn load_dotenv_to_process(path: Option<&Path>) -> AuthResult<usize> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
    let text = read_env_file(path)?;
    Ok(apply_to_process_env(&parse_env(&text)))
}

fn read_env_file(path: &Path) -> AuthResult<String> {
    std::fs::read_to_string(path).map_err(|source| AuthError::EnvFile {
        path: path.display().to_string(),
        source,
    })
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if v.len() >= 2 && v.starts_with(q) && v.ends_with(q) {
            return &v[1..v.len() - 1];
        }
    }
    v
}
