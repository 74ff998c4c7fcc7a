// Request parameter normalization (legacy hyphenated keys -> backend underscores)

use crate::core::errors::ProxyError;
use axum::body::Bytes;
use axum::extract::Request;
use http_body_util::LengthLimitError;
use std::error::Error as StdError;
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Ceiling for form-encoded request bodies (10 MiB)
pub const MAX_FORM_BYTES: usize = 10 << 20;

/// Flat key -> values mapping forwarded to PuppetDB query endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, Vec<String>>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string
    pub fn parse(input: &[u8]) -> Self {
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(input) {
            params.append(key.into_owned(), value.into_owned());
        }
        params
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Form-encode for the backend request body
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.0 {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Rewrite every hyphenated key to its underscored spelling
    ///
    /// The hyphenated key is removed; its values replace any values already
    /// stored under the underscored spelling.
    pub fn underscore_keys(&mut self) {
        let hyphenated: Vec<String> = self.0.keys().filter(|k| k.contains('-')).cloned().collect();
        for key in hyphenated {
            if let Some(values) = self.0.remove(&key) {
                self.0.insert(key.replace('-', "_"), values);
            }
        }
    }
}

/// Normalize the raw URL query and body of a legacy request
///
/// A non-empty `query` parameter in the URL means the caller sent a structured
/// backend query there, so the URL set wins and the body set is discarded.
/// Otherwise body parameters are used and URL parameters fill in missing keys.
pub fn normalize(raw_query: Option<&str>, body: &[u8]) -> Result<QueryParams, ProxyError> {
    if body.len() > MAX_FORM_BYTES {
        return Err(ProxyError::BodyTooLarge { limit: MAX_FORM_BYTES });
    }

    let body_params = QueryParams::parse(body);
    let url_params = raw_query.map(|q| QueryParams::parse(q.as_bytes())).unwrap_or_default();

    let has_structured_query = url_params.get("query").is_some_and(|q| !q.is_empty());
    let mut params = if has_structured_query {
        url_params
    } else {
        let mut merged = body_params;
        for (key, values) in url_params.0 {
            merged.0.entry(key).or_insert(values);
        }
        merged
    };

    params.underscore_keys();
    Ok(params)
}

/// Read the whole request body, at most `limit` bytes
///
/// Tripping either this ceiling or the global body limit layer is reported as
/// `BodyTooLarge`.
pub async fn read_body(request: Request, limit: usize) -> Result<Bytes, ProxyError> {
    axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| {
            if exceeded_length_limit(&e) {
                ProxyError::BodyTooLarge { limit }
            } else {
                ProxyError::RequestBody(e.to_string())
            }
        })
}

/// Both `to_bytes` and `RequestBodyLimitLayer` bury a `LengthLimitError` in the chain
fn exceeded_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Consume an inbound request and produce its normalized parameters
///
/// `body_limit` is the configured global limit; the form ceiling applies on top.
pub async fn extract_params(request: Request, body_limit: usize) -> Result<QueryParams, ProxyError> {
    let raw_query = request.uri().query().map(str::to_owned);
    let body = read_body(request, body_limit.min(MAX_FORM_BYTES)).await?;

    normalize(raw_query.as_deref(), &body)
}
