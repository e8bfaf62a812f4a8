/// Request extractors with JSON error bodies
///
/// Wrap axum's `Json`, `Query` and `Path` so decoding failures come back as
/// [`ApiError`] (`{"message": ...}`) instead of plain text.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParams<T>(pub T);

/// Deserializes a string, trimming it and mapping blank input to None
///
/// Used with `#[serde(default, deserialize_with = "blank_as_none")]` so a
/// `required` rule rejects `""` and `"   "` the same way as a missing key.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
