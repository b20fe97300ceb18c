use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{AuthError, AuthResult};

/// Decoded claims in their generic form: claim name → JSON value.
pub type ClaimsMap = serde_json::Map<String, Value>;

/// Extra-claims slot for tokens that carry nothing beyond the registered
/// fields.  Deserializing skips whatever else the payload holds; serializing
/// adds no keys.  A bare `Claims` uses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoExtraClaims;

impl Serialize for NoExtraClaims {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        s.serialize_map(Some(0))?.end()
    }
}

impl<'de> Deserialize<'de> for NoExtraClaims {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct Sink;
        impl<'de> serde::de::Visitor<'de> for Sink {
            type Value = NoExtraClaims;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("extra claims (ignored)")
            }
            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> Result<Self::Value, A::Error> {
                while map
                    .next_entry::<serde::de::IgnoredAny, serde::de::IgnoredAny>()?
                    .is_some()
                {}
                Ok(NoExtraClaims)
            }
        }
        d.deserialize_map(Sink)
    }
}

/// The `aud` claim: RFC 7519 allows a single string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(a) => a == audience,
            Self::Many(all) => all.iter().any(|a| a == audience),
        }
    }
}

impl From<&str> for Audience {
    fn from(v: &str) -> Self {
        Self::One(v.to_owned())
    }
}

impl From<String> for Audience {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<Vec<String>> for Audience {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

/// Typed claims: the registered fields plus a flattened extra-claims slot.
///
/// Every registered field is optional so that the default token (only `exp`)
/// and caller-built tokens share one shape.  `iat` and `jti` are filled in at
/// issuance when missing.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use jwt_helpers::Claims;
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Tenant {
///     #[serde(default)]
///     tenant_id: Option<String>,
/// }
///
/// let claims = Claims::expiring_in(600).subject("42").extra(Tenant { tenant_id: Some("acme".into()) });
/// assert_eq!(claims.sub.as_deref(), Some("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims<E = NoExtraClaims> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Caller-defined claims, flattened into the JWT payload.
    #[serde(flatten)]
    pub extra: E,
}

impl Claims {
    /// Claims with only `exp`, `ttl_secs` seconds from now.
    pub fn expiring_in(ttl_secs: i64) -> Self {
        Self {
            exp: Some(now_unix() + ttl_secs),
            ..Default::default()
        }
    }
}

impl<E> Claims<E> {
    /// Replace the extra-claims slot, keeping the registered fields.
    pub fn extra<X>(self, extra: X) -> Claims<X> {
        Claims {
            exp: self.exp,
            iat: self.iat,
            nbf: self.nbf,
            jti: self.jti,
            iss: self.iss,
            sub: self.sub,
            aud: self.aud,
            extra,
        }
    }

    pub fn subject(mut self, v: impl Into<String>) -> Self {
        self.sub = Some(v.into());
        self
    }
    pub fn issuer(mut self, v: impl Into<String>) -> Self {
        self.iss = Some(v.into());
        self
    }
    pub fn audience(mut self, v: impl Into<Audience>) -> Self {
        self.aud = Some(v.into());
        self
    }
    pub fn not_before(mut self, v: i64) -> Self {
        self.nbf = Some(v);
        self
    }
    pub fn expires_at(mut self, v: i64) -> Self {
        self.exp = Some(v);
        self
    }
}

/// Username/uuid pair commonly carried alongside the registered claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub uuid: String,
}

/// The claims handed to the issuer: either a free-form mapping or a typed
/// value that serializes to a JSON object.
///
/// The issuer only ever works on the mapping form; typed values cross over
/// through [`into_map`](Self::into_map).
#[derive(Debug, Clone)]
pub enum ClaimsSet<T = Claims> {
    Generic(ClaimsMap),
    Typed(T),
}

impl ClaimsSet {
    pub fn generic(map: ClaimsMap) -> Self {
        Self::Generic(map)
    }
}

impl<T> ClaimsSet<T> {
    pub fn typed(value: T) -> Self {
        Self::Typed(value)
    }
}

impl<T: Serialize> ClaimsSet<T> {
    pub fn into_map(self) -> AuthResult<ClaimsMap> {
        match self {
            Self::Generic(map) => Ok(map),
            Self::Typed(value) => to_claims_map(&value),
        }
    }
}

impl<T: DeserializeOwned> ClaimsSet<T> {
    /// Rebuild the typed form from a mapping.
    pub fn from_map(map: &ClaimsMap) -> AuthResult<Self> {
        cast_claims(map).map(Self::Typed)
    }
}

/// Serialize any value into a claims mapping.  The value must serialize to a
/// JSON object.
pub fn to_claims_map<T: Serialize + ?Sized>(value: &T) -> AuthResult<ClaimsMap> {
    match serde_json::to_value(value).map_err(|e| AuthError::Cast(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(AuthError::Cast(format!(
            "claims must be a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

/// Re-shape generic claims into a caller-supplied type.
///
/// ```rust
/// use jwt_helpers::{cast_claims, ClaimsMap, Claims, UserClaims};
///
/// let mut map = ClaimsMap::new();
/// map.insert("username".into(), "ana".into());
/// map.insert("exp".into(), 1_900_000_000.into());
///
/// let claims: Claims<UserClaims> = cast_claims(&map).unwrap();
/// assert_eq!(claims.extra.username, "ana");
/// assert_eq!(claims.exp, Some(1_900_000_000));
/// ```
pub fn cast_claims<T: DeserializeOwned>(claims: &ClaimsMap) -> AuthResult<T> {
    serde_json::from_value(Value::Object(claims.clone()))
        .map_err(|e| AuthError::Cast(e.to_string()))
}

pub(crate) fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
