use url::Url;

use crate::server::response::ApiError;

const MAX_ENDPOINT_LEN: usize = 2048;
const MAX_KEY_LEN: usize = 256;

fn is_base64url(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
}

/// Push endpoints are capability URLs issued by a push service; anything
/// that is not an absolute http(s) URL cannot be delivered to.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ApiError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ApiError::bad_request("Endpoint cannot be empty"));
    }
    if endpoint.len() > MAX_ENDPOINT_LEN {
        return Err(ApiError::bad_request(format!(
            "Endpoint cannot exceed {MAX_ENDPOINT_LEN} characters"
        )));
    }

    let url = Url::parse(endpoint).map_err(|_| ApiError::bad_request("Endpoint must be a URL"))?;
    match url.scheme() {
        "https" | "http" => Ok(()),
        scheme => Err(ApiError::bad_request(format!(
            "Endpoint scheme '{scheme}' is not supported"
        ))),
    }
}

pub fn validate_subscription_key(name: &str, value: &str) -> Result<(), ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("keys.{name} cannot be empty")));
    }
    if value.len() > MAX_KEY_LEN || !is_base64url(value) {
        return Err(ApiError::bad_request(format!(
            "keys.{name} must be base64url encoded"
        )));
    }
    Ok(())
}
