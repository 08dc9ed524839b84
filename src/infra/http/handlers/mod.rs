//! Route handlers for the public and admin surfaces.

pub mod admin;
pub mod public;
