use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;

use crate::config::ParseOptions;
use crate::error::{AuthError, AuthResult};

/// What the extractor needs from an inbound request.
///
/// Implemented for [`http::request::Parts`] and [`http::Request`]; any other
/// transport only has to provide these three lookups.
pub trait TokenSource {
    fn header(&self, name: &str) -> Option<String>;
    fn cookie(&self, name: &str) -> Option<String>;
    fn query_param(&self, name: &str) -> Option<String>;
}

impl TokenSource for http::request::Parts {
    fn header(&self, name: &str) -> Option<String> {
        header_value(&self.headers, name)
    }
    fn cookie(&self, name: &str) -> Option<String> {
        cookie_value(&self.headers, name)
    }
    fn query_param(&self, name: &str) -> Option<String> {
        query_value(self.uri.query(), name)
    }
}

impl<B> TokenSource for http::Request<B> {
    fn header(&self, name: &str) -> Option<String> {
        header_value(self.headers(), name)
    }
    fn cookie(&self, name: &str) -> Option<String> {
        cookie_value(self.headers(), name)
    }
    fn query_param(&self, name: &str) -> Option<String> {
        query_value(self.uri().query(), name)
    }
}

/// Find the raw token: `Authorization: Bearer`, then the configured cookie,
/// then the configured query parameter.  First non-blank candidate wins.
pub fn extract_token<R: TokenSource + ?Sized>(req: &R, opts: &ParseOptions) -> AuthResult<String> {
    if let Some(token) = req
        .header(AUTHORIZATION.as_str())
        .and_then(|h| parse_bearer_header(&h))
    {
        return Ok(token);
    }

    if let Some(name) = opts.cookie() {
        if let Some(value) = req.cookie(name).filter(|v| !v.trim().is_empty()) {
            return Ok(value.trim().to_owned());
        }
    }

    if let Some(name) = opts.query() {
        if let Some(value) = req.query_param(name).filter(|v| !v.trim().is_empty()) {
            return Ok(value.trim().to_owned());
        }
    }

    Err(AuthError::TokenNotFound)
}

/// True when any configured source is present on the request, blank or not.
pub(crate) fn has_token_source<R: TokenSource + ?Sized>(req: &R, opts: &ParseOptions) -> bool {
    req.header(AUTHORIZATION.as_str()).is_some()
        || opts.cookie().is_some_and(|n| req.cookie(n).is_some())
        || opts.query().is_some_and(|n| req.query_param(n).is_some())
}

/// `Bearer <token>` with a case-insensitive scheme and exactly two fields.
pub fn parse_bearer_header(value: &str) -> Option<String> {
    let mut fields = value.split_whitespace();
    let (scheme, token) = (fields.next()?, fields.next()?);
    if fields.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim().to_owned())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(cookie::Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_owned())
}

fn query_value(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
