//! Blog backend for a studio site: a TTL post cache in front of a document
//! store, served over a public and an admin HTTP API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
