use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::env::Environment;
use crate::error::{AuthError, AuthResult};

/// Clock-skew tolerance applied to `exp` and `nbf` when none is configured.
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(30);

/// Verification policy for [`parse_token`](crate::parse_token) and
/// [`parse_from_request`](crate::parse_from_request).
///
/// Build with [`new`](Self::new) and the chained setters, or with
/// [`from_env`](Self::from_env).
///
/// ```rust
/// use std::time::Duration;
/// use jwt_helpers::ParseOptions;
///
/// let opts = ParseOptions::new("secret")
///     .leeway(Duration::from_secs(5))
///     .audience("https://api.example.com")
///     .cookie_name("access_token")
///     .query_param("token");
/// assert_eq!(opts.leeway, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub secret: Vec<u8>,
    /// Header algorithms accepted.  Only the HMAC family can be satisfied by
    /// a shared secret.
    pub allowed_algorithms: Vec<Algorithm>,
    pub leeway: Duration,
    /// When set, `aud` must contain this value.
    pub audience: Option<String>,
    /// When set, `iss` must equal this value.
    pub issuer: Option<String>,
    /// Cookie tried after the `Authorization` header.
    pub cookie_name: Option<String>,
    /// Query parameter tried last.
    pub query_param: Option<String>,
}

impl ParseOptions {
    /// HS256 only, 30 s leeway, no audience/issuer checks, header-only
    /// extraction.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            allowed_algorithms: vec![Algorithm::HS256],
            leeway: DEFAULT_LEEWAY,
            audience: None,
            issuer: None,
            cookie_name: None,
            query_param: None,
        }
    }

    /// Build from an [`Environment`].
    ///
    /// | Variable          | Required | Default  | Notes                          |
    /// |-------------------|----------|----------|--------------------------------|
    /// | `JWT_SECRET`      | **yes**  | —        |                                |
    /// | `JWT_ALGORITHMS`  | no       | `HS256`  | Comma-separated                |
    /// | `JWT_LEEWAY_SECS` | no       | `30`     |                                |
    /// | `JWT_AUDIENCE`    | no       | *(unset)*| Enables the `aud` check        |
    /// | `JWT_ISSUER`      | no       | *(unset)*| Enables the `iss` check        |
    /// | `JWT_COOKIE_NAME` | no       | *(unset)*| Enables cookie extraction      |
    /// | `JWT_QUERY_PARAM` | no       | *(unset)*| Enables query extraction       |
    pub fn from_env(env: &Environment) -> AuthResult<Self> {
        let secret = non_empty(env, "JWT_SECRET")
            .ok_or_else(|| AuthError::MissingSecret("JWT_SECRET is not set".into()))?;

        let mut opts = Self::new(secret);

        if let Some(list) = non_empty(env, "JWT_ALGORITHMS") {
            opts.allowed_algorithms = list
                .split(',')
                .map(|s| {
                    Algorithm::from_str(s.trim())
                        .map_err(|_| AuthError::Config(format!("unknown algorithm {s:?}")))
                        .and_then(hmac_only)
                })
                .collect::<AuthResult<_>>()?;
        }

        if let Some(secs) = non_empty(env, "JWT_LEEWAY_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| AuthError::Config(format!("JWT_LEEWAY_SECS is not a number: {secs:?}")))?;
            opts.leeway = Duration::from_secs(secs);
        }

        opts.audience = non_empty(env, "JWT_AUDIENCE");
        opts.issuer = non_empty(env, "JWT_ISSUER");
        opts.cookie_name = non_empty(env, "JWT_COOKIE_NAME");
        opts.query_param = non_empty(env, "JWT_QUERY_PARAM");

        Ok(opts)
    }

    pub fn allowed_algorithms(mut self, v: impl IntoIterator<Item = Algorithm>) -> Self {
        self.allowed_algorithms = v.into_iter().collect();
        self
    }
    pub fn leeway(mut self, v: Duration) -> Self {
        self.leeway = v;
        self
    }
    pub fn audience(mut self, v: impl Into<String>) -> Self {
        self.audience = Some(v.into());
        self
    }
    pub fn issuer(mut self, v: impl Into<String>) -> Self {
        self.issuer = Some(v.into());
        self
    }
    pub fn cookie_name(mut self, v: impl Into<String>) -> Self {
        self.cookie_name = Some(v.into());
        self
    }
    pub fn query_param(mut self, v: impl Into<String>) -> Self {
        self.query_param = Some(v.into());
        self
    }

    /// The algorithms to accept: `[HS256]` when none are listed.  Anything
    /// outside the HMAC family is a configuration error, since a shared
    /// secret can never verify it.
    pub fn algorithms(&self) -> AuthResult<Vec<Algorithm>> {
        if self.allowed_algorithms.is_empty() {
            return Ok(vec![Algorithm::HS256]);
        }
        self.allowed_algorithms.iter().copied().map(hmac_only).collect()
    }

    /// Cookie name, if configured and non-empty.
    pub(crate) fn cookie(&self) -> Option<&str> {
        self.cookie_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Query parameter name, if configured and non-empty.
    pub(crate) fn query(&self) -> Option<&str> {
        self.query_param.as_deref().filter(|s| !s.is_empty())
    }
}

fn hmac_only(alg: Algorithm) -> AuthResult<Algorithm> {
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => Err(AuthError::Config(format!(
            "{other:?} cannot be verified with a shared secret"
        ))),
    }
}

fn non_empty(env: &Environment, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty()).map(str::to_owned)
}
