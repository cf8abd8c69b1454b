//! Conversions from external transport errors into domain errors.

use fluxbase_domain::FluxbaseError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;

/// Error newtype that keeps reqwest conversions on the client side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct TransportError(pub FluxbaseError);

impl From<TransportError> for FluxbaseError {
    fn from(value: TransportError) -> Self {
        value.0
    }
}

impl From<FluxbaseError> for TransportError {
    fn from(value: FluxbaseError) -> Self {
        TransportError(value)
    }
}

impl From<HttpError> for TransportError {
    fn from(value: HttpError) -> Self {
        if value.is_timeout() {
            return TransportError(FluxbaseError::Network("HTTP request timed out".into()));
        }

        if value.is_connect() {
            return TransportError(FluxbaseError::Network("HTTP connection failure".into()));
        }

        if let Some(status) = value.status() {
            return TransportError(status_to_error(status, ""));
        }

        TransportError(FluxbaseError::Network(value.to_string()))
    }
}

/// Classify a non-2xx HTTP status (plus whatever body text the server sent)
/// into a domain error. The original status code is preserved on the `Api`
/// variant so callers can branch on it.
pub fn status_to_error(status: StatusCode, body: &str) -> FluxbaseError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        extract_server_message(body)
    };

    match status.as_u16() {
        401 | 403 => FluxbaseError::Auth(format!("HTTP {}: {}", status.as_u16(), message)),
        404 => FluxbaseError::NotFound(format!("HTTP {}: {}", status.as_u16(), message)),
        code => FluxbaseError::Api { status: code, message },
    }
}

/// Pull a human-readable message out of a server error body.
///
/// The backend wraps errors as `{"error": {"message": ...}}` or
/// `{"message": ...}`; anything else is passed through verbatim.
fn extract_server_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .or_else(|| json.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }
    body.to_string()
}
