//! Application services layer.

pub mod admin;
pub mod blog;
pub mod error;
pub mod repos;
