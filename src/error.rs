use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    status: u16,
}

/// Why a signature check failed.
///
/// Both faults surface as [`AuthError::InvalidSignature`]; the fault is kept
/// so callers that care can tell a forged algorithm from a forged signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFault {
    /// The header declares an algorithm outside the allowed set.
    Algorithm,
    /// The signature bytes do not match the secret.
    Mismatch,
}

impl std::fmt::Display for SignatureFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Algorithm => f.write_str("signing algorithm not allowed"),
            Self::Mismatch => f.write_str("signature mismatch"),
        }
    }
}

/// Fieldless mirror of [`AuthError`] for branching without matching payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingSecret,
    Signing,
    TokenNotFound,
    InvalidSignature,
    TokenExpired,
    TokenNotYetValid,
    ClaimsInvalid,
    MalformedToken,
    Cast,
    EnvFile,
    Hashing,
    Entropy,
    Conversion,
    Config,
}

/// Errors from token, secret, password and env-file operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing secret: {0}")]
    MissingSecret(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Token not found in request")]
    TokenNotFound,

    #[error("Invalid signature: {0}")]
    InvalidSignature(SignatureFault),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token is not yet valid")]
    TokenNotYetValid,

    #[error("Invalid claims: {0}")]
    ClaimsInvalid(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Cannot cast claims: {0}")]
    Cast(String),

    #[error("Cannot read env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Secure random source unavailable: {0}")]
    Entropy(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Auth not configured: {0}")]
    Config(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSecret(_) => ErrorKind::MissingSecret,
            Self::Signing(_) => ErrorKind::Signing,
            Self::TokenNotFound => ErrorKind::TokenNotFound,
            Self::InvalidSignature(_) => ErrorKind::InvalidSignature,
            Self::TokenExpired => ErrorKind::TokenExpired,
            Self::TokenNotYetValid => ErrorKind::TokenNotYetValid,
            Self::ClaimsInvalid(_) => ErrorKind::ClaimsInvalid,
            Self::MalformedToken(_) => ErrorKind::MalformedToken,
            Self::Cast(_) => ErrorKind::Cast,
            Self::EnvFile { .. } => ErrorKind::EnvFile,
            Self::Hashing(_) => ErrorKind::Hashing,
            Self::Entropy(_) => ErrorKind::Entropy,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// True when the token was otherwise valid but past `exp`.  Callers use
    /// this to decide whether a refresh token should be consulted.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::MissingSecret => "MISSING_SECRET",
            ErrorKind::Signing => "SIGNING_ERROR",
            ErrorKind::TokenNotFound => "TOKEN_NOT_FOUND",
            ErrorKind::InvalidSignature => "INVALID_SIGNATURE",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            ErrorKind::ClaimsInvalid => "CLAIMS_INVALID",
            ErrorKind::MalformedToken => "MALFORMED_TOKEN",
            ErrorKind::Cast => "CAST_ERROR",
            ErrorKind::EnvFile => "ENV_FILE_ERROR",
            ErrorKind::Hashing => "HASHING_ERROR",
            ErrorKind::Entropy => "ENTROPY_ERROR",
            ErrorKind::Conversion => "CONVERSION_ERROR",
            ErrorKind::Config => "CONFIG_ERROR",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as Jwt;
        match e.kind() {
            Jwt::InvalidSignature => AuthError::InvalidSignature(SignatureFault::Mismatch),
            // Raised before any signature bytes are compared.
            Jwt::InvalidAlgorithm | Jwt::InvalidAlgorithmName => {
                AuthError::InvalidSignature(SignatureFault::Algorithm)
            }
            Jwt::ExpiredSignature => AuthError::TokenExpired,
            Jwt::ImmatureSignature => AuthError::TokenNotYetValid,
            Jwt::InvalidIssuer => AuthError::ClaimsInvalid("issuer mismatch".into()),
            Jwt::InvalidAudience => AuthError::ClaimsInvalid("audience mismatch".into()),
            Jwt::InvalidSubject => AuthError::ClaimsInvalid("subject mismatch".into()),
            Jwt::MissingRequiredClaim(claim) => {
                AuthError::ClaimsInvalid(format!("missing required claim `{claim}`"))
            }
            _ => AuthError::MalformedToken(e.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::MissingSecret
            | ErrorKind::Signing
            | ErrorKind::EnvFile
            | ErrorKind::Hashing
            | ErrorKind::Entropy
            | ErrorKind::Conversion
            | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}
