//! Address classification and DNS resolution.
//!
//! Negotiators never touch DNS directly: they classify the host first and
//! only call a [`Resolve`] implementation for real domain names.

pub mod classify;
pub mod resolve;

pub use classify::{HostKind, classify, strip_brackets};
pub use resolve::{
    AddressFamily, BlockingResolve, GaiResolver, HickoryResolver, Resolve, ResolveError,
    ResolvedAddress, StaticResolver, TokioResolver, select_address,
};
