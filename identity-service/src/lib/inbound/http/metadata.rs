use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::header::USER_AGENT;

use crate::domain::session::models::SessionMetadata;

const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const DEVICE_INFO: HeaderName = HeaderName::from_static("x-device-info");

/// Client details of the current request, recorded on new sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata(pub SessionMetadata);

#[async_trait]
impl<S> FromRequestParts<S> for ClientMetadata
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMetadata(session_metadata(&parts.headers)))
    }
}

/// Build session metadata from request headers.
///
/// Only the first `X-Forwarded-For` entry is kept.
pub fn session_metadata(headers: &HeaderMap) -> SessionMetadata {
    SessionMetadata {
        device_info: header_value(headers, &DEVICE_INFO),
        ip_address: header_value(headers, &FORWARDED_FOR)
            .and_then(|value| value.split(',').next().map(|first| first.trim().to_string()))
            .filter(|first| !first.is_empty()),
        user_agent: header_value(headers, &USER_AGENT),
    }
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_metadata_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.0"));
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert(DEVICE_INFO, HeaderValue::from_static("iPhone"));

        let metadata = session_metadata(&headers);

        assert_eq!(metadata.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(metadata.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(metadata.device_info.as_deref(), Some("iPhone"));
    }

    #[test]
    fn test_missing_headers_leave_fields_empty() {
        assert_eq!(session_metadata(&HeaderMap::new()), SessionMetadata::default());
    }
}
