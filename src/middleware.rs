use axum::extract::FromRequestParts;
use http::request::Parts;
use serde::de::DeserializeOwned;

use crate::claims::ClaimsMap;
use crate::config::ParseOptions;
use crate::error::AuthError;
use crate::extract::has_token_source;
use crate::token::parse_from_request;

/// Axum extractor: pulls the token from the request, validates it against
/// the [`ParseOptions`] extension and casts the claims into `T`.
///
/// `T` defaults to the generic [`ClaimsMap`].
///
/// ```rust,no_run
/// use axum::{routing::get, Extension, Router};
/// use jwt_helpers::{Claims, ParseOptions, UserClaims, VerifiedToken};
///
/// async fn handler(token: VerifiedToken<Claims<UserClaims>>) -> String {
///     format!("hello {}", token.claims.extra.username)
/// }
///
/// # async fn example() {
/// let opts = ParseOptions::new("secret").cookie_name("access_token");
/// let app: Router = Router::new()
///     .route("/me", get(handler))
///     .layer(Extension(opts));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VerifiedToken<T = ClaimsMap> {
    pub claims: T,

    /// Raw token (useful for forwarding to another service).
    pub token: String,
}

impl<S, T> FromRequestParts<S> for VerifiedToken<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let opts = options(parts)?;
        let parsed = parse_from_request(&*parts, &opts)?;
        let claims = parsed.claims_as::<T>()?;

        Ok(VerifiedToken {
            claims,
            token: parsed.raw,
        })
    }
}

/// Like [`VerifiedToken`] but yields `None` when the request has none of the
/// configured token sources.  A present but invalid token still rejects.
#[derive(Debug, Clone)]
pub struct OptionalVerifiedToken<T = ClaimsMap>(Option<VerifiedToken<T>>);

impl<T> OptionalVerifiedToken<T> {
    pub fn into_inner(self) -> Option<VerifiedToken<T>> {
        self.0
    }
    pub fn as_option(&self) -> Option<&VerifiedToken<T>> {
        self.0.as_ref()
    }
}

impl<S, T> FromRequestParts<S> for OptionalVerifiedToken<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let opts = options(parts)?;
        if !has_token_source(&*parts, &opts) {
            return Ok(Self(None));
        }
        VerifiedToken::from_request_parts(parts, state)
            .await
            .map(|t| Self(Some(t)))
    }
}

fn options(parts: &Parts) -> Result<ParseOptions, AuthError> {
    parts.extensions.get::<ParseOptions>().cloned().ok_or_else(|| {
        AuthError::Config("ParseOptions not found, add `.layer(Extension(options))`".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claims, ClaimsSet, UserClaims};
    use crate::error::ErrorKind;
    use crate::token::generate_token_with;

    const SECRET: &[u8] = b"middleware-secret";

    fn parts(headers: &[(&str, &str)], opts: Option<ParseOptions>) -> Parts {
        let mut builder = http::Request::builder().uri("/me");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(opts) = opts {
            parts.extensions.insert(opts);
        }
        parts
    }

    fn user_token() -> String {
        let claims = Claims::expiring_in(60).extra(UserClaims {
            username: "ana".into(),
            uuid: "u-1".into(),
        });
        generate_token_with(SECRET, ClaimsSet::typed(claims)).unwrap()
    }

    #[tokio::test]
    async fn extracts_typed_claims_from_cookie() {
        let token = user_token();
        let cookie = format!("session={token}");
        let mut p = parts(
            &[("cookie", cookie.as_str())],
            Some(ParseOptions::new(SECRET).cookie_name("session")),
        );

        let verified = VerifiedToken::<Claims<UserClaims>>::from_request_parts(&mut p, &())
            .await
            .unwrap();
        assert_eq!(verified.claims.extra.username, "ana");
        assert_eq!(verified.token, token);
    }

    #[tokio::test]
    async fn missing_options_is_config_error() {
        let bearer = format!("Bearer {}", user_token());
        let mut p = parts(&[("authorization", bearer.as_str())], None);
        let err = VerifiedToken::<ClaimsMap>::from_request_parts(&mut p, &())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn optional_without_token_is_none() {
        let mut p = parts(&[], Some(ParseOptions::new(SECRET)));
        let out = OptionalVerifiedToken::<ClaimsMap>::from_request_parts(&mut p, &())
            .await
            .unwrap();
        assert!(out.as_option().is_none());
        assert!(out.into_inner().is_none());
    }

    #[tokio::test]
    async fn optional_with_valid_token_is_some() {
        let bearer = format!("Bearer {}", user_token());
        let mut p = parts(&[("authorization", bearer.as_str())], Some(ParseOptions::new(SECRET)));
        let out = OptionalVerifiedToken::<Claims<UserClaims>>::from_request_parts(&mut p, &())
            .await
            .unwrap();
        let verified = out.as_option().unwrap();
        assert_eq!(verified.claims.extra.uuid, "u-1");
    }

    #[tokio::test]
    async fn optional_with_bad_token_rejects() {
        let mut p = parts(
            &[("authorization", "Bearer not.a.token")],
            Some(ParseOptions::new(SECRET)),
        );
        assert!(OptionalVerifiedToken::<ClaimsMap>::from_request_parts(&mut p, &())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn wrong_secret_rejects() {
        let bearer = format!("Bearer {}", user_token());
        let mut p = parts(
            &[("authorization", bearer.as_str())],
            Some(ParseOptions::new("other-secret")),
        );
        let err = VerifiedToken::<ClaimsMap>::from_request_parts(&mut p, &())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }
}
