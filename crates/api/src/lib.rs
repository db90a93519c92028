//! AI editor analysis API library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! analysis engine) so integration tests and the binary entrypoint can both
//! access them.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
