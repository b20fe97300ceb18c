//! # jwt-helpers
//!
//! Small helpers for services that hand out HS256 JWTs: issue tokens with
//! default or custom claims, find and verify them on inbound requests, and
//! classify failures so callers can tell "expired" from "forged".  Also
//! bundled: bcrypt password hashing, a minimal `.env` loader and a few
//! serde map conversions.
//!
//! ## Issue and verify
//!
//! ```rust
//! use jwt_helpers::{generate_token, verify_token, AuthError};
//!
//! let token = generate_token(b"abcde12345").unwrap();
//! assert!(verify_token(&token, b"abcde12345").unwrap());
//!
//! match verify_token(&token, b"wrong") {
//!     Err(AuthError::InvalidSignature(_)) => {}
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! ## Custom claims
//!
//! ```rust
//! use jwt_helpers::{generate_token_with, get_claims_as, Claims, ClaimsSet, UserClaims};
//!
//! let claims = Claims::expiring_in(3600).extra(UserClaims {
//!     username: "ana".into(),
//!     uuid: "0b7e".into(),
//! });
//! let token = generate_token_with(b"secret", ClaimsSet::typed(claims)).unwrap();
//!
//! let back: Claims<UserClaims> = get_claims_as(&token, b"secret").unwrap();
//! assert_eq!(back.extra.username, "ana");
//! assert!(back.jti.is_some());
//! ```
//!
//! ## From a request
//!
//! The token is looked up in the `Authorization: Bearer` header, then in the
//! configured cookie, then in the configured query parameter.
//!
//! ```rust
//! use jwt_helpers::{generate_token, parse_from_request, ParseOptions};
//!
//! let token = generate_token(b"secret").unwrap();
//! let req = http::Request::builder()
//!     .header("cookie", format!("access_token={token}"))
//!     .body(())
//!     .unwrap();
//!
//! let opts = ParseOptions::new("secret").cookie_name("access_token");
//! let parsed = parse_from_request(&req, &opts).unwrap();
//! assert!(parsed.claims.contains_key("exp"));
//! ```
//!
//! ## Secrets from a `.env` file
//!
//! ```rust,no_run
//! use jwt_helpers::{Environment, SecretProvider};
//!
//! let mut env = Environment::from_process();
//! env.load_default_file().unwrap();
//! let secret = SecretProvider::new(env).resolve("SECRET_KEY", true).unwrap();
//! ```

pub mod claims;
pub mod config;
pub mod convert;
pub mod env;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod secret;
pub mod token;

pub use claims::{cast_claims, Audience, Claims, ClaimsMap, ClaimsSet, NoExtraClaims, UserClaims};
pub use config::ParseOptions;
pub use env::Environment;
pub use error::{AuthError, AuthResult, ErrorKind, SignatureFault};
pub use extract::{extract_token, TokenSource};
pub use middleware::{OptionalVerifiedToken, VerifiedToken};
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use secret::SecretProvider;
pub use token::{
    ensure_unique_claims, generate_jti, generate_token, generate_token_with,
    get_claims, get_claims_as, get_claims_as_from_request, get_claims_from_request,
    parse_from_request, parse_token, verify_from_request, verify_token, ParsedToken,
};

pub use jsonwebtoken::Algorithm;
