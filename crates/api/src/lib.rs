//! HTTP API: server, routing, and request/response mapping for invoices.

pub mod app;
pub mod config;
pub mod middleware;
