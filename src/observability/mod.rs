//! Observability subsystem.
//!
//! Structured logging via the tracing crate; the request path is
//! instrumented by tower-http's TraceLayer in the HTTP server.

pub mod logging;
