pub mod protected;
pub mod public;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Handlers take `Json<Value>` and parse here, so malformed bodies come back
/// in the same error envelope as every other failure instead of axum's
/// default rejection text.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::validation_error(format!("Invalid request body: {}", e)))
}
