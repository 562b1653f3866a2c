//! HTTP API: routing, request/response mapping and the auth gate.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
