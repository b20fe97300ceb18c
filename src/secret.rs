use crate::env::Environment;
use crate::error::{AuthError, AuthResult};

/// Resolves signing/verification key material.
///
/// Holds an explicit [`Environment`] instead of reading the process
/// environment at lookup time, so tests and services can inject their own.
///
/// ```rust
/// use jwt_helpers::{Environment, SecretProvider};
///
/// let env = Environment::from_pairs([("SECRET_KEY", "abc123456XYZ")]);
/// let provider = SecretProvider::new(env);
///
/// assert_eq!(provider.resolve("SECRET_KEY", true).unwrap(), b"abc123456XYZ");
/// assert_eq!(provider.resolve("literal-secret", false).unwrap(), b"literal-secret");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SecretProvider {
    env: Environment,
}

impl SecretProvider {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    /// Provider over a snapshot of the current process environment.
    pub fn from_process_env() -> Self {
        Self::new(Environment::from_process())
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// With `from_env == false` the name itself is the secret.  Otherwise the
    /// name is looked up in the environment and must be non-empty.
    pub fn resolve(&self, name: &str, from_env: bool) -> AuthResult<Vec<u8>> {
        if !from_env {
            return Ok(name.as_bytes().to_vec());
        }
        match self.env.get(name) {
            Some(v) if !v.is_empty() => Ok(v.as_bytes().to_vec()),
            _ => Err(AuthError::MissingSecret(format!(
                "there is no env variable with the name of '{name}'"
            ))),
        }
    }
}
