//! Fluent proxy builder.
//!
//! Setters never fail; the first problem is kept and reported by
//! [`ProxyBuilder::build`] or [`ProxyBuilder::build_blocking`].

pub mod auth;
pub mod core;
pub mod options;

pub use core::ProxyBuilder;
