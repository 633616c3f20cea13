//! Response synthesis.
//!
//! # Responsibilities
//! - Pick the status: 200, the `X-Stub-Status` override, 400 for a bad or
//!   informational (1xx) override, 500 when the body source cannot be opened
//! - Pick the body source from the content mode
//! - Emit `Content-Type: <mime>; charset=<charset>` and `X-Request-ID`
//! - Stream the body exactly once
//!
//! # Lifecycle
//! ```text
//! Pending → StatusResolved → HeadersSent → BodyStreaming → Complete
//! ```
//! Head and body are fixed when the [`ResponseDescriptor`] turns into a
//! response; the last two transitions happen inside [`SynthesizedBody`] as
//! the transport pulls bytes. `Complete` is reached on every exit path,
//! including copy failures and early drops.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::future::BoxFuture;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::content::{buffer_request_body, ContentHandle, ContentResolver};
use crate::http::context::{ContentMode, RequestContext};
use crate::http::directives::{
    content_selector, parse_status, DEFAULT_CHARSET, DEFAULT_MIME_TYPE,
    INVALID_STATUS_FALLBACK, X_REQUEST_ID,
};
use crate::http::middleware::chain::{Handler, StubRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisState {
    Pending,
    StatusResolved,
    HeadersSent,
    BodyStreaming,
    Complete,
}

impl SynthesisState {
    pub fn next(self) -> Option<Self> {
        match self {
            SynthesisState::Pending => Some(SynthesisState::StatusResolved),
            SynthesisState::StatusResolved => Some(SynthesisState::HeadersSent),
            SynthesisState::HeadersSent => Some(SynthesisState::BodyStreaming),
            SynthesisState::BodyStreaming => Some(SynthesisState::Complete),
            SynthesisState::Complete => None,
        }
    }
}

/// Tracks one response through [`SynthesisState`], one step at a time.
#[derive(Debug)]
pub struct Progress {
    state: SynthesisState,
    request_id: String,
}

impl Progress {
    pub fn new(request_id: &str) -> Self {
        Self {
            state: SynthesisState::Pending,
            request_id: request_id.to_string(),
        }
    }

    pub fn state(&self) -> SynthesisState {
        self.state
    }

    /// Move one step forward. Already complete responses stay complete.
    pub fn step(&mut self) -> SynthesisState {
        if let Some(next) = self.state.next() {
            tracing::trace!(
                request_id = %self.request_id,
                from = ?self.state,
                to = ?next,
                "Synthesis transition"
            );
            self.state = next;
        }
        self.state
    }

    /// Step forward until `target` is reached, visiting every state between.
    pub fn advance_to(&mut self, target: SynthesisState) {
        while self.state != target && self.state != SynthesisState::Complete {
            self.step();
        }
    }
}

/// Where the body bytes come from.
#[derive(Debug)]
pub enum BodySource {
    Empty,
    Buffered(Bytes),
    File(ContentHandle),
}

/// Everything needed to write one response.
#[derive(Debug)]
pub struct ResponseDescriptor {
    pub status: StatusCode,
    pub mime_type: String,
    pub charset: String,
    pub body: BodySource,
}

impl ResponseDescriptor {
    pub fn content_type(&self) -> String {
        format!("{}; charset={}", self.mime_type, self.charset)
    }

    /// Fix the head and hand the body to the transport.
    pub fn into_response(self, mut progress: Progress) -> Response {
        progress.advance_to(SynthesisState::StatusResolved);

        let content_type = HeaderValue::from_bytes(self.content_type().as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    request_id = %progress.request_id,
                    value = %self.content_type(),
                    "Content-Type not representable, using default"
                );
                HeaderValue::from_static("application/octet-stream; charset=utf-8")
            });

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type);
        if let Ok(id) = HeaderValue::from_str(&progress.request_id) {
            headers.insert(X_REQUEST_ID, id);
        }

        let (mut parts, ()) = Response::new(()).into_parts();
        parts.status = self.status;
        parts.headers = headers;
        progress.advance_to(SynthesisState::HeadersSent);

        Response::from_parts(parts, Body::new(SynthesizedBody::new(self.body, progress)))
    }
}

/// Body stream for a synthesized response.
#[derive(Debug)]
pub struct SynthesizedBody {
    source: BodySource,
    progress: Progress,
    done: bool,
}

impl SynthesizedBody {
    pub fn new(source: BodySource, progress: Progress) -> Self {
        Self {
            source,
            progress,
            done: false,
        }
    }

    pub fn state(&self) -> SynthesisState {
        self.progress.state()
    }

    fn finish(&mut self) {
        self.done = true;
        self.progress.advance_to(SynthesisState::Complete);
    }
}

impl HttpBody for SynthesizedBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        this.progress.advance_to(SynthesisState::BodyStreaming);

        let chunk = match &mut this.source {
            BodySource::Empty => Ok(None),
            BodySource::Buffered(bytes) if bytes.is_empty() => Ok(None),
            BodySource::Buffered(bytes) => Ok(Some(std::mem::take(bytes))),
            BodySource::File(handle) => match handle.poll_chunk(cx) {
                Poll::Ready(result) => result,
                Poll::Pending => return Poll::Pending,
            },
        };

        match chunk {
            Ok(Some(data)) => Poll::Ready(Some(Ok(Frame::data(data)))),
            Ok(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Err(err) => {
                tracing::error!(
                    request_id = %this.progress.request_id,
                    error = %err,
                    "Failed to write response"
                );
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.done
            || match &self.source {
                BodySource::Empty => true,
                BodySource::Buffered(bytes) => bytes.is_empty(),
                BodySource::File(_) => false,
            }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.source {
            _ if self.done => SizeHint::with_exact(0),
            BodySource::Empty => SizeHint::with_exact(0),
            BodySource::Buffered(bytes) => SizeHint::with_exact(bytes.len() as u64),
            BodySource::File(_) => SizeHint::default(),
        }
    }
}

impl Drop for SynthesizedBody {
    fn drop(&mut self) {
        self.progress.advance_to(SynthesisState::Complete);
    }
}

/// Terminal handler: turns the annotated context into a response.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    resolver: ContentResolver,
    max_body_bytes: usize,
}

impl ResponseSynthesizer {
    pub fn new(resolver: ContentResolver, max_body_bytes: usize) -> Self {
        Self {
            resolver,
            max_body_bytes,
        }
    }

    /// Resolve status and body source for one request.
    pub async fn synthesize(
        &self,
        request: StubRequest,
        ctx: &RequestContext,
    ) -> ResponseDescriptor {
        let mut status = match parse_status(request.headers()) {
            // hyper cannot send a 1xx as the final response
            Ok(Some(status)) if status.is_informational() => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    value = status.as_u16(),
                    "Informational status cannot end a response"
                );
                INVALID_STATUS_FALLBACK
            }
            Ok(Some(status)) => status,
            Ok(None) => StatusCode::OK,
            Err(err) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    value = %err.value(),
                    error = %err,
                    "Invalid response status"
                );
                INVALID_STATUS_FALLBACK
            }
        };

        let body = match ctx.content_mode {
            ContentMode::None => Ok(BodySource::Empty),
            ContentMode::File => {
                let selector = content_selector(request.headers()).unwrap_or_default();
                self.resolver.resolve(&selector).await.map(|handle| {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        path = %handle.path().display(),
                        size = handle.size(),
                        "Serving content file"
                    );
                    BodySource::File(handle)
                })
            }
            ContentMode::Echo => buffer_request_body(request.into_body(), self.max_body_bytes)
                .await
                .map(BodySource::Buffered),
        };

        let body = body.unwrap_or_else(|err| {
            tracing::error!(
                request_id = %ctx.request_id,
                content_mode = %ctx.content_mode,
                error = %err,
                "Failed to load response content"
            );
            status = StatusCode::INTERNAL_SERVER_ERROR;
            BodySource::Empty
        });

        ResponseDescriptor {
            status,
            mime_type: non_empty_or(&ctx.mime_type, DEFAULT_MIME_TYPE),
            charset: non_empty_or(&ctx.charset, DEFAULT_CHARSET),
            body,
        }
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() { default } else { value }.to_string()
}

impl Handler for ResponseSynthesizer {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let progress = Progress::new(&ctx.request_id);
            let descriptor = self.synthesize(request, ctx).await;
            descriptor.into_response(progress)
        })
    }
}
