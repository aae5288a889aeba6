//! `Authorization: Basic` credential parsing.

use axum::http::{header, HeaderMap};
use base64ct::{Base64, Encoding};

/// Email/password pair carried by a Basic authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let encoded = extract_base64_authorization_header(value)?;
        let decoded = decode_base64_authorization_header(encoded)?;
        let (email, password) = extract_user_credentials(&decoded)?;
        Some(Self { email, password })
    }
}

/// Base64 part of a `Basic <...>` header value.
pub fn extract_base64_authorization_header(header: &str) -> Option<&str> {
    header.strip_prefix("Basic ")
}

pub fn decode_base64_authorization_header(encoded: &str) -> Option<String> {
    let bytes = Base64::decode_vec(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Splits on the first `:` only; passwords may contain colons.
pub fn extract_user_credentials(decoded: &str) -> Option<(String, String)> {
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn requires_basic_prefix() {
        assert_eq!(extract_base64_authorization_header("Basic abc"), Some("abc"));
        assert_eq!(extract_base64_authorization_header("Bearer abc"), None);
        assert_eq!(extract_base64_authorization_header("Basicabc"), None);
    }

    #[test]
    fn decodes_utf8_only() {
        assert_eq!(
            decode_base64_authorization_header("SG9sYmVydG9u").as_deref(),
            Some("Holberton")
        );
        assert_eq!(decode_base64_authorization_header("not base64!"), None);
        // 0xff 0xfe is valid base64 but not UTF-8
        assert_eq!(decode_base64_authorization_header("//4="), None);
    }

    #[test]
    fn splits_on_first_colon() {
        assert_eq!(
            extract_user_credentials("bob@x.com:pa:ss"),
            Some(("bob@x.com".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(extract_user_credentials("no-colon"), None);
    }

    #[test]
    fn from_headers_full_chain() {
        let mut headers = HeaderMap::new();
        let encoded = Base64::encode_string(b"bob@x.com:H0lb:erton");
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        let creds = BasicCredentials::from_headers(&headers).unwrap();
        assert_eq!(creds.email, "bob@x.com");
        assert_eq!(creds.password, "H0lb:erton");

        assert!(BasicCredentials::from_headers(&HeaderMap::new()).is_none());
    }
}
