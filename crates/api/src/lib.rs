//! HTTP API for the `User` resource: path dispatch, handlers, response mapping.

pub mod app;
pub mod config;
