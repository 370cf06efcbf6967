//! Rate limiting
//!
//! Keeps request volume towards a quote provider under its published limits.

pub mod limiter;

pub use limiter::RateLimiter;
