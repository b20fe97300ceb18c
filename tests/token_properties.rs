//! End-to-end checks: issue → wire → extract → verify → cast.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;

use jwt_helpers::env::parse_env;
use jwt_helpers::*;

const SECRET: &[u8] = b"abcde12345";

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn sign(claims: serde_json::Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

/// Flip one character of the signature segment to another base64url char.
fn tamper(token: &str, offset: usize) -> String {
    let sig_start = token.rfind('.').unwrap() + 1;
    let mut bytes = token.as_bytes().to_vec();
    let idx = sig_start + offset;
    bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).unwrap()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Session {
    username: String,
    uuid: String,
    #[serde(default)]
    exp: Option<i64>,
}

#[test]
fn issued_payload_always_has_iat_and_jti() {
    let typed = Session {
        username: "ana".into(),
        uuid: "u-1".into(),
        exp: Some(now() + 60),
    };
    let mut generic = ClaimsMap::new();
    generic.insert("role".into(), json!("admin"));

    let tokens = [
        generate_token(SECRET).unwrap(),
        generate_token_with(SECRET, ClaimsSet::typed(typed)).unwrap(),
        generate_token_with(SECRET, ClaimsSet::generic(generic)).unwrap(),
    ];

    for token in &tokens {
        let claims = get_claims(token, SECRET).unwrap();
        assert!(claims["iat"].as_i64().is_some_and(|iat| iat > 0));
        assert!(claims["jti"].as_str().is_some_and(|jti| !jti.is_empty()));
    }
}

#[test]
fn round_trip_verifies() {
    let claims = Claims::expiring_in(300).subject("42");
    let token = generate_token_with(SECRET, ClaimsSet::typed(claims)).unwrap();
    assert!(verify_token(&token, SECRET).unwrap());
}

#[test]
fn tampered_signature_is_rejected() {
    let token = generate_token(SECRET).unwrap();
    for offset in [0, 10, 20, 30] {
        let bad = tamper(&token, offset);
        assert_ne!(bad, token);
        let err = verify_token(&bad, SECRET).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature, "offset {offset}");
    }
}

#[test]
fn expiry_respects_leeway() {
    let expired = sign(json!({ "exp": now() - 3600 }));
    assert!(matches!(verify_token(&expired, SECRET), Err(AuthError::TokenExpired)));

    let grace = sign(json!({ "exp": now() - 5 }));
    assert!(verify_token(&grace, SECRET).unwrap());
}

#[test]
fn header_beats_cookie() {
    let header_token = generate_token(SECRET).unwrap();
    let cookie_token = generate_token(SECRET).unwrap();
    let req = http::Request::builder()
        .header("Authorization", format!("Bearer {header_token}"))
        .header("Cookie", format!("jwt={cookie_token}"))
        .body(())
        .unwrap();

    let opts = ParseOptions::new(SECRET).cookie_name("jwt");
    assert_eq!(extract_token(&req, &opts).unwrap(), header_token);
    assert_eq!(parse_from_request(&req, &opts).unwrap().raw, header_token);
}

#[test]
fn default_token_scenario() {
    let issued_at = now();
    let token = generate_token(b"abcde12345").unwrap();
    let claims = get_claims(&token, b"abcde12345").unwrap();

    assert!((claims["exp"].as_i64().unwrap() - (issued_at + 12 * 60)).abs() <= 2);
    assert!((claims["iat"].as_i64().unwrap() - issued_at).abs() <= 2);
    let jti = claims["jti"].as_str().unwrap();
    assert_eq!(jti.len(), 32);
    assert!(jti.bytes().all(|b| b.is_ascii_hexdigit()));
}

#[test]
fn wrong_secret_scenario() {
    let token = generate_token(SECRET).unwrap();
    assert!(matches!(
        verify_token(&token, b"not-the-secret"),
        Err(AuthError::InvalidSignature(_))
    ));
}

#[test]
fn algorithm_substitution_is_rejected() {
    let token = generate_token(SECRET).unwrap();
    let payload = token.split('.').nth(1).unwrap();

    let none_header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let unsigned = format!("{none_header}.{payload}.");
    let err = verify_token(&unsigned, SECRET).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    let stronger = encode(
        &Header::new(Algorithm::HS512),
        &get_claims(&token, SECRET).unwrap(),
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap();
    let err = verify_token(&stronger, SECRET).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn required_aud_and_iss_must_be_present() {
    let token = generate_token(SECRET).unwrap();

    let err = parse_token(&token, &ParseOptions::new(SECRET).audience("api")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClaimsInvalid);

    let err = parse_token(&token, &ParseOptions::new(SECRET).issuer("auth")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClaimsInvalid);
}

#[test]
fn secret_from_env_file_scenario() {
    let mut env = Environment::new();
    env.merge(parse_env("SECRET_KEY=abc123456XYZ\n"));
    let provider = SecretProvider::new(env);

    assert_eq!(provider.resolve("SECRET_KEY", true).unwrap(), b"abc123456XYZ");
    assert!(matches!(
        provider.resolve("UNSET_KEY", true),
        Err(AuthError::MissingSecret(_))
    ));
}

#[test]
fn env_secret_signs_and_verifies() {
    let provider = SecretProvider::new(Environment::from_pairs([("SECRET_KEY", "abc123456XYZ")]));
    let secret = provider.resolve("SECRET_KEY", true).unwrap();

    let token = generate_token(&secret).unwrap();
    assert!(verify_token(&token, &secret).unwrap());
}

#[test]
fn cast_into_caller_type() {
    let session = Session {
        username: "ana".into(),
        uuid: "u-1".into(),
        exp: Some(now() + 60),
    };
    let token = generate_token_with(SECRET, ClaimsSet::typed(session)).unwrap();

    let back: Session = get_claims_as(&token, SECRET).unwrap();
    assert_eq!(back.username, "ana");

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct WrongShape {
        username: u64,
    }
    assert!(matches!(
        get_claims_as::<WrongShape>(&token, SECRET),
        Err(AuthError::Cast(_))
    ));
}

#[test]
fn expired_error_drives_refresh_decision() {
    let access = sign(json!({ "exp": now() - 3600, "typ": "access" }));
    let refresh = generate_token_with(
        SECRET,
        ClaimsSet::typed(Claims::expiring_in(86_400).subject("42")),
    )
    .unwrap();

    let refreshed = match verify_token(&access, SECRET) {
        Err(e) if e.is_expired() => verify_token(&refresh, SECRET).unwrap(),
        _ => false,
    };
    assert!(refreshed);
}
