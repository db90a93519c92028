//! Request middleware.
//!
//! - [`rate_limit::enforce`] -- per-client token bucket on `/api/v1`.

pub mod rate_limit;
