use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::TryRngCore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::claims::{cast_claims, now_unix, Claims, ClaimsMap, ClaimsSet};
use crate::config::ParseOptions;
use crate::error::{AuthError, AuthResult, SignatureFault};
use crate::extract::{extract_token, TokenSource};

/// Lifetime of a token issued without caller-supplied claims.
pub const DEFAULT_TTL_SECS: i64 = 12 * 60;

/// Random bytes behind each generated `jti`.
pub const JTI_BYTES: usize = 16;

/// A token that passed signature and claim validation.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub header: Header,
    pub claims: ClaimsMap,
    /// The compact token text it was parsed from.
    pub raw: String,
}

impl ParsedToken {
    /// Cast the decoded claims into `T`.
    pub fn claims_as<T: DeserializeOwned>(&self) -> AuthResult<T> {
        cast_claims(&self.claims)
    }
}

/// Hex-encoded random `jti` from the OS CSPRNG.
pub fn generate_jti() -> AuthResult<String> {
    let mut bytes = [0u8; JTI_BYTES];
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Fill in `iat` and `jti` when absent.  Values already present are kept.
pub fn ensure_unique_claims(mut claims: ClaimsMap) -> AuthResult<ClaimsMap> {
    if !claims.contains_key("iat") {
        claims.insert("iat".into(), Value::from(now_unix()));
    }
    if !claims.contains_key("jti") {
        claims.insert("jti".into(), Value::from(generate_jti()?));
    }
    Ok(claims)
}

/// Sign a token carrying only `exp` (12 minutes out) plus `iat` and `jti`.
///
/// ```rust
/// use jwt_helpers::{generate_token, verify_token};
///
/// let token = generate_token(b"abcde12345").unwrap();
/// assert_eq!(verify_token(&token, b"abcde12345").unwrap(), true);
/// ```
pub fn generate_token(secret: &[u8]) -> AuthResult<String> {
    generate_token_with(secret, ClaimsSet::typed(Claims::expiring_in(DEFAULT_TTL_SECS)))
}

/// Sign caller-supplied claims with HS256.
///
/// `iat` and `jti` are injected when missing, whether the claims arrive as a
/// map or as a typed value.
///
/// ```rust
/// use serde::Serialize;
/// use jwt_helpers::{generate_token_with, Claims, ClaimsSet};
///
/// #[derive(Serialize)]
/// struct Extra { tenant_id: String }
///
/// let claims = Claims::expiring_in(3600).subject("42").extra(Extra { tenant_id: "acme".into() });
/// let token = generate_token_with(b"secret", ClaimsSet::typed(claims)).unwrap();
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn generate_token_with<T: Serialize>(secret: &[u8], claims: ClaimsSet<T>) -> AuthResult<String> {
    let claims = ensure_unique_claims(claims.into_map()?)?;

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))?;

    tracing::debug!(jti = ?claims.get("jti"), "issued token");
    Ok(token)
}

/// Check a token against `secret` with the default policy.
///
/// Returns `Ok(true)` when valid; every failure is an error, never
/// `Ok(false)`.
pub fn verify_token(token: &str, secret: &[u8]) -> AuthResult<bool> {
    parse_token(token, &ParseOptions::new(secret)).map(|_| true)
}

/// Decoded claims of a token checked with the default policy.
pub fn get_claims(token: &str, secret: &[u8]) -> AuthResult<ClaimsMap> {
    parse_token(token, &ParseOptions::new(secret)).map(|t| t.claims)
}

/// Like [`get_claims`] but cast into `T`.
pub fn get_claims_as<T: DeserializeOwned>(token: &str, secret: &[u8]) -> AuthResult<T> {
    parse_token(token, &ParseOptions::new(secret))?.claims_as()
}

/// Parse and validate `token` under `opts`.
///
/// The secret is used as given, empty or not; only the request path insists
/// on one being configured.
pub fn parse_token(token: &str, opts: &ParseOptions) -> AuthResult<ParsedToken> {
    let algorithms = opts.algorithms()?;

    let data = check_declared_algorithm(token, &algorithms)
        .and_then(|()| {
            decode::<ClaimsMap>(
                token,
                &DecodingKey::from_secret(&opts.secret),
                &validation(opts, algorithms),
            )
            .map_err(AuthError::from)
        })
        .inspect_err(|err| tracing::debug!(error = %err, "token rejected"))?;

    Ok(ParsedToken {
        header: data.header,
        claims: data.claims,
        raw: token.to_owned(),
    })
}

/// Extract the token from `req` and validate it.
pub fn parse_from_request<R: TokenSource + ?Sized>(
    req: &R,
    opts: &ParseOptions,
) -> AuthResult<ParsedToken> {
    if opts.secret.is_empty() {
        return Err(AuthError::MissingSecret("parse options carry no secret".into()));
    }
    let raw = extract_token(req, opts)?;
    parse_token(&raw, opts)
}

/// `Ok(true)` when the request carries a valid token.
pub fn verify_from_request<R: TokenSource + ?Sized>(req: &R, opts: &ParseOptions) -> AuthResult<bool> {
    parse_from_request(req, opts).map(|_| true)
}

pub fn get_claims_from_request<R: TokenSource + ?Sized>(
    req: &R,
    opts: &ParseOptions,
) -> AuthResult<ClaimsMap> {
    parse_from_request(req, opts).map(|t| t.claims)
}

pub fn get_claims_as_from_request<T, R>(req: &R, opts: &ParseOptions) -> AuthResult<T>
where
    T: DeserializeOwned,
    R: TokenSource + ?Sized,
{
    parse_from_request(req, opts)?.claims_as()
}

/// Reject the header's `alg` before any signature work.  jsonwebtoken cannot
/// even deserialize names it does not know (`none` among them), which would
/// otherwise surface as a malformed token.
fn check_declared_algorithm(token: &str, allowed: &[Algorithm]) -> AuthResult<()> {
    let segment = token.split('.').next().unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {e}")))?;
    let header: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("header is not JSON: {e}")))?;

    let declared = header
        .get("alg")
        .and_then(Value::as_str)
        .and_then(|name| Algorithm::from_str(name).ok());
    match declared {
        Some(alg) if allowed.contains(&alg) => Ok(()),
        _ => Err(AuthError::InvalidSignature(SignatureFault::Algorithm)),
    }
}

/// `algorithms` is non-empty: it comes from [`ParseOptions::algorithms`].
fn validation(opts: &ParseOptions, algorithms: Vec<Algorithm>) -> Validation {
    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms;
    validation.leeway = opts.leeway.as_secs();
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // `exp` is checked when present; tokens without it are accepted.
    validation.required_spec_claims.clear();

    if let Some(iss) = &opts.issuer {
        validation.set_issuer(&[iss]);
    }

    if let Some(aud) = &opts.audience {
        validation.set_audience(&[aud]);
    } else {
        validation.validate_aud = false;
    }

    validation
}
