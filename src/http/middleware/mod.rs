//! Request-handling stages.
//!
//! # Stage Order
//! ```text
//! request_id → access_log → delay → content_type → content_mode → charset
//!     → ResponseSynthesizer (terminal)
//! ```
//!
//! Every stage writes at most one context field and only reads fields
//! written by stages declared before it.

pub mod access_log;
pub mod chain;
pub mod delay;
pub mod negotiation;
pub mod request_id;

use std::sync::Arc;

pub use access_log::access_log;
pub use chain::{stage, BoxHandler, Handler, Stage, StageChain, StubRequest};
pub use delay::delay;
pub use negotiation::{charset, content_mode, content_type};
pub use request_id::request_id;

use crate::http::request::IdGenerator;

/// The stages every stub server runs, in order, ahead of the synthesizer.
pub fn default_stages(generator: Arc<dyn IdGenerator>) -> StageChain {
    StageChain::new(vec![
        request_id(generator),
        access_log(),
        delay(),
        content_type(),
        content_mode(),
        charset(),
    ])
}
