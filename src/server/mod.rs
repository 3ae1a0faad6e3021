//! Request context and response plumbing shared by the router and the
//! dispatcher.
//!
//! No transport lives here: a [`RequestEnv`] is built from an
//! `http::Request` and a [`ResponseBuffer`] turns back into an
//! `http::Response` or raw HTTP/1.1 bytes.

pub mod request;
pub mod response;

pub use request::{normalize_request_path, parse_query_params, RequestContext, RequestEnv};
pub use response::{Emit, JsonResponse, Responder, Response, ResponseBuffer, ResponseSink};
