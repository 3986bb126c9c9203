//! Entrypoint response envelope
//!
//! Both entrypoints answer with the same gateway-shaped response: 200 with
//! an empty body on success, 500 with "Error" on any handled failure.

use serde::Serialize;

/// Response returned by the batch and webhook entrypoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResponse {
    /// Always false; the body is plain text
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
    /// HTTP-equivalent status code
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Response headers, always empty
    pub headers: serde_json::Map<String, serde_json::Value>,
    /// Response body
    pub body: String,
}

impl InvocationResponse {
    /// Successful invocation
    #[must_use]
    pub fn ok() -> Self {
        Self {
            is_base64_encoded: false,
            status_code: 200,
            headers: serde_json::Map::new(),
            body: String::new(),
        }
    }

    /// Handled failure
    #[must_use]
    pub fn error() -> Self {
        Self {
            is_base64_encoded: false,
            status_code: 500,
            headers: serde_json::Map::new(),
            body: "Error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() -> Result<(), serde_json::Error> {
        let ok = serde_json::to_value(InvocationResponse::ok())?;
        assert_eq!(ok["statusCode"], 200);
        assert_eq!(ok["body"], "");
        assert_eq!(ok["isBase64Encoded"], false);

        let err = serde_json::to_value(InvocationResponse::error())?;
        assert_eq!(err["statusCode"], 500);
        assert_eq!(err["body"], "Error");
        Ok(())
    }
}
