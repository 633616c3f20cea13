//! `X-Stub-Delay` enforcement.
//!
//! The sleep is a tokio timer, so it parks only this request's task. No upper
//! bound is applied; callers choose how long a worker is held.

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;
use crate::http::directives::parse_delay;
use crate::http::middleware::chain::{stage, BoxHandler, Handler, Stage, StubRequest};

pub struct DelayStage {
    next: BoxHandler,
}

impl Handler for DelayStage {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match parse_delay(request.headers()) {
                Ok(Some(delay)) => {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        delay_ms = delay.as_millis() as u64,
                        "Delaying response"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        value = %err.value(),
                        error = %err,
                        "Invalid delay value"
                    );
                }
            }
            self.next.handle(request, ctx).await
        })
    }
}

pub fn delay() -> Stage {
    stage(|next| DelayStage { next })
}
