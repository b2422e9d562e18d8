//! HTTP API: configuration, routing, and request/response mapping for the
//! reconciliation engine.

pub mod app;
pub mod config;
