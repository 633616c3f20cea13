//! Request id assignment. Must be the outermost stage so every later log
//! line can be correlated.

use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;
use crate::http::directives::parse_request_id;
use crate::http::middleware::chain::{stage, BoxHandler, Handler, Stage, StubRequest};
use crate::http::request::IdGenerator;

pub struct RequestIdStage {
    generator: Arc<dyn IdGenerator>,
    next: BoxHandler,
}

impl Handler for RequestIdStage {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.request_id = parse_request_id(request.headers(), self.generator.as_ref());
            self.next.handle(request, ctx).await
        })
    }
}

pub fn request_id(generator: Arc<dyn IdGenerator>) -> Stage {
    stage(move |next| RequestIdStage {
        generator: generator.clone(),
        next,
    })
}
