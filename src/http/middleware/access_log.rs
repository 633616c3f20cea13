//! Access logging.
//!
//! Logs the request on the way in, then wraps the response body in a
//! [`RecordedBody`] that counts the bytes actually handed to the transport.
//! The response record is logged when the body is dropped, which happens
//! after the last byte is written or when the peer goes away.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{header::CONTENT_LENGTH, HeaderMap, Method, StatusCode},
    response::Response,
};
use futures_util::future::BoxFuture;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::http::context::RequestContext;
use crate::http::middleware::chain::{stage, BoxHandler, Handler, Stage, StubRequest};

pub struct AccessLogStage {
    next: BoxHandler,
}

impl Handler for AccessLogStage {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let started = Instant::now();
            let method = request.method().clone();
            let remote = request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_default();
            let content_length = request
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            tracing::info!(
                event = "request",
                request_id = %ctx.request_id,
                method = %request.method(),
                url = %request.uri(),
                protocol = ?request.version(),
                remote = %remote,
                content_length = ?content_length,
                headers = %flatten_headers(request.headers()),
                "Request received"
            );

            let response = self.next.handle(request, ctx).await;

            let (parts, body) = response.into_parts();
            let record = ResponseRecord {
                request_id: ctx.request_id.clone(),
                method,
                status: parts.status,
                headers: flatten_headers(&parts.headers),
                started,
                bytes: 0,
                complete: false,
                error: None,
            };
            Response::from_parts(parts, Body::new(RecordedBody::new(body, record)))
        })
    }
}

pub fn access_log() -> Stage {
    stage(|next| AccessLogStage { next })
}

/// `name: value` pairs joined with `, `; repeated names join their values
/// with `,`.
pub fn flatten_headers(headers: &HeaderMap) -> String {
    headers
        .keys()
        .map(|name| {
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            format!("{}: {}", name, values.join(","))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// What the transport saw of one response.
#[derive(Debug)]
pub struct ResponseRecord {
    pub request_id: String,
    pub method: Method,
    pub status: StatusCode,
    pub headers: String,
    pub started: Instant,
    pub bytes: u64,
    pub complete: bool,
    pub error: Option<String>,
}

impl ResponseRecord {
    /// HEAD, 1xx, 204 and 304 responses go out without a body, so the
    /// transport never polls one.
    pub fn body_forbidden(&self) -> bool {
        self.method == Method::HEAD
            || self.status.is_informational()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED
    }

    fn log(&self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        if self.complete {
            tracing::info!(
                event = "response",
                request_id = %self.request_id,
                status = self.status.as_u16(),
                bytes = self.bytes,
                elapsed_ms,
                headers = %self.headers,
                "Response sent"
            );
        } else {
            tracing::warn!(
                event = "response",
                request_id = %self.request_id,
                status = self.status.as_u16(),
                bytes = self.bytes,
                elapsed_ms,
                error = self.error.as_deref().unwrap_or("connection closed"),
                "Response incomplete"
            );
        }
    }
}

/// Response body wrapper that records status and byte count.
pub struct RecordedBody {
    inner: Body,
    record: ResponseRecord,
}

impl RecordedBody {
    pub fn new(inner: Body, record: ResponseRecord) -> Self {
        Self { inner, record }
    }
}

impl HttpBody for RecordedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.record.bytes += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.record.error = Some(err.to_string());
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.record.complete = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for RecordedBody {
    fn drop(&mut self) {
        // hyper skips polling bodies that report end-of-stream up front,
        // and bodies the response may not carry
        if self.record.error.is_none()
            && (self.inner.is_end_stream() || self.record.body_forbidden())
        {
            self.record.complete = true;
        }
        self.record.log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SharedBuffer;
    use axum::http::HeaderValue;
    use futures_util::future::poll_fn;

    fn record() -> ResponseRecord {
        ResponseRecord {
            request_id: "r-1".to_string(),
            method: Method::GET,
            status: StatusCode::OK,
            headers: String::new(),
            started: Instant::now(),
            bytes: 0,
            complete: false,
            error: None,
        }
    }

    #[test]
    fn test_flatten_headers_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-one", HeaderValue::from_static("1"));
        headers.append("x-many", HeaderValue::from_static("a"));
        headers.append("x-many", HeaderValue::from_static("b"));

        let flat = flatten_headers(&headers);
        assert!(flat.contains("x-one: 1"));
        assert!(flat.contains("x-many: a,b"));
    }

    #[tokio::test]
    async fn test_recorded_body_counts_bytes() {
        let mut body = RecordedBody::new(Body::from("hello world"), record());
        let mut seen = Vec::new();
        while let Some(frame) = poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
            if let Ok(data) = frame.unwrap().into_data() {
                seen.extend_from_slice(&data);
            }
        }
        assert_eq!(seen, b"hello world");
        assert_eq!(body.record.bytes, 11);
        assert!(body.record.complete);
    }

    #[test]
    fn test_recorded_body_keeps_size_hint() {
        let body = RecordedBody::new(Body::from("abc"), record());
        assert_eq!(body.size_hint().exact(), Some(3));
    }

    #[test]
    fn test_bodiless_responses_are_complete_without_polling() {
        let head = ResponseRecord {
            method: Method::HEAD,
            ..record()
        };
        let no_content = ResponseRecord {
            status: StatusCode::NO_CONTENT,
            ..record()
        };
        assert!(head.body_forbidden());
        assert!(no_content.body_forbidden());
        assert!(!record().body_forbidden());
    }

    #[test]
    fn test_unpolled_head_body_logged_as_sent() {
        let logs = SharedBuffer::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let head = ResponseRecord {
            method: Method::HEAD,
            ..record()
        };
        // never reports end-of-stream, like a file body
        let stream = futures_util::stream::pending::<Result<Bytes, std::io::Error>>();
        drop(RecordedBody::new(Body::from_stream(stream), head));

        let output = logs.contents();
        assert!(output.contains("Response sent"));
        assert!(!output.contains("Response incomplete"));
    }

    #[test]
    fn test_unpolled_get_body_logged_as_incomplete() {
        let logs = SharedBuffer::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let stream = futures_util::stream::pending::<Result<Bytes, std::io::Error>>();
        drop(RecordedBody::new(Body::from_stream(stream), record()));

        let output = logs.contents();
        assert!(output.contains("Response incomplete"));
        assert!(output.contains("connection closed"));
    }
}
