//! HTTP API: adapter chain, per-request session middleware, and the
//! companies collection handlers.

pub mod adapter;
pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
