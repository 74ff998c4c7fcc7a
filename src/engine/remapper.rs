// Backend query results -> legacy shapes

use crate::core::errors::ProxyError;
use crate::schema::OneOrMany;
use serde::de::DeserializeOwned;

/// Decode a 200 backend body as `B`, one object or an array of them
pub fn decode<B: DeserializeOwned>(body: &[u8]) -> Result<OneOrMany<B>, ProxyError> {
    serde_json::from_slice(body).map_err(|e| ProxyError::BackendResponse(e.to_string()))
}

/// Decode with the backend-shaped type and convert every record to the legacy one
///
/// The outer shape is kept: an object stays an object, an array stays an array.
pub fn remap<B, L>(body: &[u8]) -> Result<OneOrMany<L>, ProxyError>
where
    B: DeserializeOwned,
    L: From<B>,
{
    Ok(decode::<B>(body)?.map_into())
}
