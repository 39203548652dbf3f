//! Request and response views consumed by the pipeline.
//!
//! These are transport-neutral: an adapter for a concrete web runtime maps its
//! own request into a [`Request`] and writes the finished [`Response`] back.

mod context;
mod request;
mod response;

pub use context::{Items, RequestContext};
pub use hyper::{HeaderMap, Method, StatusCode};
pub use request::Request;
pub use response::{Body, Response};
