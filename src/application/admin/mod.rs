//! Application services for the administrative surface.

pub mod posts;

pub use posts::AdminPostService;
