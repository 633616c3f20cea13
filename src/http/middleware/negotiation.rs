//! Content negotiation stages: media type, body source and charset.
//!
//! Each stage writes a single context field and never looks at the
//! response.

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;
use crate::http::directives::{
    parse_charset, parse_content_mode, parse_content_type, DEFAULT_MIME_TYPE,
};
use crate::http::middleware::chain::{stage, BoxHandler, Handler, Stage, StubRequest};

pub struct ContentTypeStage {
    next: BoxHandler,
}

impl Handler for ContentTypeStage {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.mime_type = match parse_content_type(request.headers()) {
                Ok(mime_type) => mime_type,
                Err(err) => {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        value = %err.value(),
                        error = %err,
                        "Invalid MIME type/parameters"
                    );
                    DEFAULT_MIME_TYPE.to_string()
                }
            };
            self.next.handle(request, ctx).await
        })
    }
}

pub struct ContentModeStage {
    next: BoxHandler,
}

impl Handler for ContentModeStage {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.content_mode = parse_content_mode(request.headers());
            tracing::debug!(
                request_id = %ctx.request_id,
                content_mode = %ctx.content_mode,
                "Content mode selected"
            );
            self.next.handle(request, ctx).await
        })
    }
}

pub struct CharsetStage {
    next: BoxHandler,
}

impl Handler for CharsetStage {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.charset = parse_charset(request.headers());
            self.next.handle(request, ctx).await
        })
    }
}

pub fn content_type() -> Stage {
    stage(|next| ContentTypeStage { next })
}

pub fn content_mode() -> Stage {
    stage(|next| ContentModeStage { next })
}

pub fn charset() -> Stage {
    stage(|next| CharsetStage { next })
}
