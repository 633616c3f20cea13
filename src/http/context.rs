//! Per-request annotations shared by the stage chain.
//!
//! One `RequestContext` is created per request and passed by `&mut` down the
//! chain. Each field has exactly one writer stage:
//!
//! | field          | written by      |
//! |----------------|-----------------|
//! | `request_id`   | request id      |
//! | `mime_type`    | content type    |
//! | `content_mode` | content mode    |
//! | `charset`      | charset         |
//!
//! Readers must be ordered after the writer.

use crate::http::directives::{DEFAULT_CHARSET, DEFAULT_MIME_TYPE};

/// Where the response body comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Empty body.
    #[default]
    None,
    /// Request body replayed byte-for-byte.
    Echo,
    /// File under the content root.
    File,
}

impl ContentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentMode::None => "none",
            ContentMode::Echo => "echo",
            ContentMode::File => "file",
        }
    }
}

impl std::fmt::Display for ContentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub mime_type: String,
    pub charset: String,
    pub content_mode: ContentMode,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: String::new(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            content_mode: ContentMode::None,
        }
    }

    /// Value for the response `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("{}; charset={}", self.mime_type, self.charset)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_type() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.content_type(), "application/octet-stream; charset=utf-8");
        assert_eq!(ctx.content_mode, ContentMode::None);
    }
}
