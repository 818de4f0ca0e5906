//! HTTP API: configuration, application wiring, controllers, and services.

pub mod app;
pub mod authz;
pub mod config;
pub mod middleware;
