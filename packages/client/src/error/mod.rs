//! Error taxonomy for proxy negotiation.
//!
//! Every failure on the connect path is one of the [`Error`] variants. The
//! constructor functions in this module are the only way the rest of the
//! crate builds errors, which keeps messages consistent across the blocking
//! and tokio paths.

pub mod classification;
pub mod constructors;
pub mod types;

pub use constructors::*;
pub use types::{Error, Result};

pub use crate::dns::ResolveError;
