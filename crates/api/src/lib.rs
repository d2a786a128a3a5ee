//! HTTP API: configuration, routing, authorization middleware and
//! request/response mapping for the drinks menu.

pub mod app;
pub mod config;
pub mod middleware;
