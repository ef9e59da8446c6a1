//! HTTP API: configuration, auth middleware, routing and services.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
