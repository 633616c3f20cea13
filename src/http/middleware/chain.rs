//! Stage chain composition.
//!
//! A stage is a constructor `(next handler) -> handler`. The chain keeps the
//! constructors in declaration order and folds them right-to-left onto the
//! terminal handler, so the first stage declared is the outermost: it runs
//! first on the way in and last on the way out.
//!
//! ```text
//! StageChain::new(vec![a, b, c]).then(terminal)
//!     == a(b(c(terminal)))
//! ```

use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response};
use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;

pub type StubRequest = Request<Body>;

/// One link of the chain, or the terminal handler.
///
/// The context is borrowed for the whole call, so annotations written by a
/// stage before it awaits `next` are visible to every inner stage, and
/// annotations written by inner stages are visible after `next` returns.
pub trait Handler: Send + Sync + 'static {
    fn handle<'a>(
        &'a self,
        request: StubRequest,
        ctx: &'a mut RequestContext,
    ) -> BoxFuture<'a, Response>;
}

pub type BoxHandler = Arc<dyn Handler>;

/// Wraps the next handler into a new one.
pub type Stage = Box<dyn Fn(BoxHandler) -> BoxHandler + Send + Sync>;

/// Build a [`Stage`] from a constructor of a concrete handler.
pub fn stage<F, H>(make: F) -> Stage
where
    F: Fn(BoxHandler) -> H + Send + Sync + 'static,
    H: Handler,
{
    Box::new(move |next| Arc::new(make(next)) as BoxHandler)
}

/// Ordered, immutable list of stages.
pub struct StageChain {
    stages: Vec<Stage>,
}

impl StageChain {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Compose the chain around `terminal`.
    pub fn then<H: Handler>(&self, terminal: H) -> BoxHandler {
        self.stages
            .iter()
            .rev()
            .fold(Arc::new(terminal) as BoxHandler, |next, stage| stage(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: &'static str,
        trace: Trace,
        next: BoxHandler,
    }

    impl Handler for Recording {
        fn handle<'a>(
            &'a self,
            request: StubRequest,
            ctx: &'a mut RequestContext,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.trace.lock().unwrap().push(format!("{} in", self.name));
                let response = self.next.handle(request, ctx).await;
                self.trace.lock().unwrap().push(format!("{} out", self.name));
                response
            })
        }
    }

    struct ShortCircuit;

    impl Handler for ShortCircuit {
        fn handle<'a>(
            &'a self,
            _request: StubRequest,
            _ctx: &'a mut RequestContext,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::IM_A_TEAPOT;
                response
            })
        }
    }

    struct Terminal {
        trace: Trace,
    }

    impl Handler for Terminal {
        fn handle<'a>(
            &'a self,
            _request: StubRequest,
            ctx: &'a mut RequestContext,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.trace.lock().unwrap().push("terminal".to_string());
                ctx.charset = "seen-by-terminal".to_string();
                Response::new(Body::empty())
            })
        }
    }

    fn recording(name: &'static str, trace: &Trace) -> Stage {
        let trace = trace.clone();
        stage(move |next| Recording {
            name,
            trace: trace.clone(),
            next,
        })
    }

    #[tokio::test]
    async fn test_first_declared_stage_is_outermost() {
        let trace = Trace::default();
        let chain = StageChain::new(vec![
            recording("a", &trace),
            recording("b", &trace),
            recording("c", &trace),
        ]);

        let handler = chain.then(Terminal {
            trace: trace.clone(),
        });
        let mut ctx = RequestContext::new();
        handler.handle(Request::new(Body::empty()), &mut ctx).await;

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["a in", "b in", "c in", "terminal", "c out", "b out", "a out"]
        );
        assert_eq!(ctx.charset, "seen-by-terminal");
    }

    #[tokio::test]
    async fn test_stage_can_terminate_early() {
        let trace = Trace::default();
        let chain = StageChain::new(vec![
            recording("a", &trace),
            stage(|_next| ShortCircuit),
            recording("never", &trace),
        ]);
        let handler = chain.then(Terminal {
            trace: trace.clone(),
        });

        let mut ctx = RequestContext::new();
        let response = handler.handle(Request::new(Body::empty()), &mut ctx).await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(*trace.lock().unwrap(), vec!["a in", "a out"]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_terminal() {
        let trace = Trace::default();
        let chain = StageChain::new(Vec::new());

        let handler = chain.then(Terminal {
            trace: trace.clone(),
        });
        let mut ctx = RequestContext::new();
        handler.handle(Request::new(Body::empty()), &mut ctx).await;
        assert_eq!(*trace.lock().unwrap(), vec!["terminal"]);
    }
}
