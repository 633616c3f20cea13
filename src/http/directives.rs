//! Stub directives carried in request headers.
//!
//! Every directive is optional. The parsers only interpret header values;
//! warnings for malformed directives are emitted by the stage that owns the
//! decision so they can carry the request id.
//!
//! An empty header value counts as absent, except for `X-Stub-Echo` whose
//! presence alone switches echo mode on.

use std::borrow::Cow;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, StatusCode};

use crate::http::context::ContentMode;
use crate::http::request::IdGenerator;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_STUB_DELAY: HeaderName = HeaderName::from_static("x-stub-delay");
pub const X_STUB_STATUS: HeaderName = HeaderName::from_static("x-stub-status");
pub const X_STUB_CONTENT_TYPE: HeaderName = HeaderName::from_static("x-stub-content-type");
pub const X_STUB_CHARSET: HeaderName = HeaderName::from_static("x-stub-charset");
pub const X_STUB_ECHO: HeaderName = HeaderName::from_static("x-stub-echo");
pub const X_STUB_CONTENT: HeaderName = HeaderName::from_static("x-stub-content");

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Status sent when `X-Stub-Status` is present but unusable.
pub const INVALID_STATUS_FALLBACK: StatusCode = StatusCode::BAD_REQUEST;

/// A directive header that was present but could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("{header} value {value:?} is not an integer")]
    NotAnInteger { header: &'static str, value: String },

    #[error("status {value} is outside 100..600")]
    StatusOutOfRange { value: String },

    #[error("{value:?} is not a valid media type: {reason}")]
    InvalidMediaType { value: String, reason: String },
}

impl DirectiveError {
    /// The raw header value that was rejected.
    pub fn value(&self) -> &str {
        match self {
            DirectiveError::NotAnInteger { value, .. }
            | DirectiveError::StatusOutOfRange { value }
            | DirectiveError::InvalidMediaType { value, .. } => value,
        }
    }
}

fn directive<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<Cow<'a, str>> {
    let value = headers.get(name)?;
    let text = String::from_utf8_lossy(value.as_bytes());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Incoming `X-Request-ID`, or a fresh id from `generator`.
pub fn parse_request_id(headers: &HeaderMap, generator: &dyn IdGenerator) -> String {
    match directive(headers, &X_REQUEST_ID) {
        Some(id) => id.into_owned(),
        None => generator.generate(),
    }
}

/// `X-Stub-Delay` in milliseconds. Zero and negative values mean no delay.
pub fn parse_delay(headers: &HeaderMap) -> Result<Option<Duration>, DirectiveError> {
    let Some(raw) = directive(headers, &X_STUB_DELAY) else {
        return Ok(None);
    };
    let millis: i64 = raw.parse().map_err(|_| DirectiveError::NotAnInteger {
        header: "X-Stub-Delay",
        value: raw.to_string(),
    })?;

    if millis <= 0 {
        return Ok(None);
    }
    Ok(Some(Duration::from_millis(millis.unsigned_abs())))
}

/// `X-Stub-Status`, restricted to `100..600`.
///
/// `Ok(None)` means the directive is absent and the default status applies.
pub fn parse_status(headers: &HeaderMap) -> Result<Option<StatusCode>, DirectiveError> {
    let Some(raw) = directive(headers, &X_STUB_STATUS) else {
        return Ok(None);
    };
    let code: i64 = raw.parse().map_err(|_| DirectiveError::NotAnInteger {
        header: "X-Stub-Status",
        value: raw.to_string(),
    })?;

    let out_of_range = || DirectiveError::StatusOutOfRange {
        value: raw.to_string(),
    };
    if !(100..600).contains(&code) {
        return Err(out_of_range());
    }
    let code = u16::try_from(code).map_err(|_| out_of_range())?;
    StatusCode::from_u16(code).map(Some).map_err(|_| out_of_range())
}

/// `X-Stub-Content-Type` reduced to its lowercase `type/subtype`.
pub fn parse_content_type(headers: &HeaderMap) -> Result<String, DirectiveError> {
    match directive(headers, &X_STUB_CONTENT_TYPE) {
        Some(raw) => parse_media_type(&raw).map_err(|err| DirectiveError::InvalidMediaType {
            value: raw.to_string(),
            reason: err.to_string(),
        }),
        None => Ok(DEFAULT_MIME_TYPE.to_string()),
    }
}

/// `X-Stub-Charset` verbatim. Unregistered labels are passed through.
pub fn parse_charset(headers: &HeaderMap) -> String {
    directive(headers, &X_STUB_CHARSET)
        .map(Cow::into_owned)
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}

/// File beats echo, whatever order the headers arrived in.
pub fn parse_content_mode(headers: &HeaderMap) -> ContentMode {
    if directive(headers, &X_STUB_CONTENT).is_some() {
        ContentMode::File
    } else if headers.contains_key(&X_STUB_ECHO) {
        ContentMode::Echo
    } else {
        ContentMode::None
    }
}

/// Raw `X-Stub-Content` selector, before any path handling.
pub fn content_selector(headers: &HeaderMap) -> Option<String> {
    directive(headers, &X_STUB_CONTENT).map(Cow::into_owned)
}

/// Validate `type/subtype *( ";" parameter )` and return the lowercase
/// essence. Parameters must be well formed but are dropped.
pub fn parse_media_type(raw: &str) -> Result<String, mime::FromStrError> {
    let media_type: mime::Mime = raw.trim().parse()?;
    Ok(media_type.essence_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct FixedId;

    impl IdGenerator for FixedId {
        fn generate(&self) -> String {
            "generated".to_string()
        }
    }

    fn headers(pairs: &[(&HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append((*name).clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_request_id_prefers_incoming_header() {
        let map = headers(&[(&X_REQUEST_ID, "abc-123")]);
        assert_eq!(parse_request_id(&map, &FixedId), "abc-123");
    }

    #[test]
    fn test_request_id_generated_when_missing_or_empty() {
        assert_eq!(parse_request_id(&HeaderMap::new(), &FixedId), "generated");
        let map = headers(&[(&X_REQUEST_ID, "")]);
        assert_eq!(parse_request_id(&map, &FixedId), "generated");
    }

    #[test]
    fn test_delay_parsing() {
        assert_eq!(parse_delay(&HeaderMap::new()), Ok(None));
        assert_eq!(
            parse_delay(&headers(&[(&X_STUB_DELAY, "250")])),
            Ok(Some(Duration::from_millis(250)))
        );
        assert_eq!(parse_delay(&headers(&[(&X_STUB_DELAY, "0")])), Ok(None));
        assert_eq!(parse_delay(&headers(&[(&X_STUB_DELAY, "-40")])), Ok(None));

        let err = parse_delay(&headers(&[(&X_STUB_DELAY, "soon")])).unwrap_err();
        assert_eq!(err.value(), "soon");
    }

    #[test]
    fn test_status_in_range() {
        for code in [100u16, 200, 204, 302, 418, 503, 599] {
            let value = code.to_string();
            let map = headers(&[(&X_STUB_STATUS, value.as_str())]);
            assert_eq!(
                parse_status(&map),
                Ok(Some(StatusCode::from_u16(code).unwrap()))
            );
        }
    }

    #[test]
    fn test_status_rejected_values() {
        for raw in ["99", "600", "999", "-200", "abc", "20x", "1e2"] {
            let err = parse_status(&headers(&[(&X_STUB_STATUS, raw)])).unwrap_err();
            assert_eq!(err.value(), raw);
        }
    }

    #[test]
    fn test_status_absent_is_distinct_from_invalid() {
        assert_eq!(parse_status(&HeaderMap::new()), Ok(None));
        assert_eq!(parse_status(&headers(&[(&X_STUB_STATUS, "")])), Ok(None));
    }

    #[test]
    fn test_content_type_default_and_parameters() {
        assert_eq!(
            parse_content_type(&HeaderMap::new()).unwrap(),
            DEFAULT_MIME_TYPE
        );
        let map = headers(&[(&X_STUB_CONTENT_TYPE, "Application/JSON; charset=latin1")]);
        assert_eq!(parse_content_type(&map).unwrap(), "application/json");
    }

    #[test]
    fn test_media_type_syntax() {
        assert_eq!(parse_media_type("text/plain").unwrap(), "text/plain");
        assert_eq!(parse_media_type(" Text/HTML ").unwrap(), "text/html");
        assert_eq!(
            parse_media_type(r#"multipart/form-data; boundary="a;b""#).unwrap(),
            "multipart/form-data"
        );
        assert_eq!(
            parse_media_type("application/vnd.api+json").unwrap(),
            "application/vnd.api+json"
        );

        assert!(parse_media_type("text").is_err());
        assert!(parse_media_type("/plain").is_err());
        assert!(parse_media_type("te xt/plain").is_err());
        assert!(parse_media_type("text/plain; charset").is_err());
        assert!(parse_media_type(r#"text/plain; a="open"#).is_err());
    }

    #[test]
    fn test_invalid_content_type_reports_raw_value() {
        let map = headers(&[(&X_STUB_CONTENT_TYPE, "not a mime")]);
        let err = parse_content_type(&map).unwrap_err();
        assert_eq!(err.value(), "not a mime");
    }

    #[test]
    fn test_charset_is_verbatim() {
        assert_eq!(parse_charset(&HeaderMap::new()), DEFAULT_CHARSET);
        let map = headers(&[(&X_STUB_CHARSET, "x-made-up-charset")]);
        assert_eq!(parse_charset(&map), "x-made-up-charset");
    }

    #[test]
    fn test_content_mode_precedence() {
        assert_eq!(parse_content_mode(&HeaderMap::new()), ContentMode::None);
        assert_eq!(
            parse_content_mode(&headers(&[(&X_STUB_ECHO, "")])),
            ContentMode::Echo
        );
        assert_eq!(
            parse_content_mode(&headers(&[(&X_STUB_CONTENT, "a.json")])),
            ContentMode::File
        );
        assert_eq!(
            parse_content_mode(&headers(&[(&X_STUB_ECHO, "1"), (&X_STUB_CONTENT, "a.json")])),
            ContentMode::File
        );
        assert_eq!(
            parse_content_mode(&headers(&[(&X_STUB_CONTENT, "a.json"), (&X_STUB_ECHO, "1")])),
            ContentMode::File
        );
        assert_eq!(
            parse_content_mode(&headers(&[(&X_STUB_CONTENT, ""), (&X_STUB_ECHO, "1")])),
            ContentMode::Echo
        );
    }
}
