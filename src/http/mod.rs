//! HTTP transport layer: routing, handlers and error mapping.

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
