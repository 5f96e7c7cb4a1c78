//! Resolver traits.

use std::future::Future;
use std::sync::Arc;

use super::types::{ResolveError, ResolvedAddress};

/// Maps a hostname to a single IP address.
///
/// Implementations are shared across concurrent connect attempts, so they
/// take `&self` and must be `Send + Sync`.
pub trait Resolve: Send + Sync {
    /// Resolves `host` (a domain name, never an IP literal).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the lookup fails or yields no address.
    fn resolve(
        &self,
        host: &str,
    ) -> impl Future<Output = Result<ResolvedAddress, ResolveError>> + Send;
}

/// Marker for resolvers whose futures complete without a runtime.
///
/// The blocking connector drives resolution with a plain executor, so it only
/// accepts resolvers that never wait on reactor I/O.
pub trait BlockingResolve: Resolve {}

impl<R: Resolve> Resolve for Arc<R> {
    fn resolve(
        &self,
        host: &str,
    ) -> impl Future<Output = Result<ResolvedAddress, ResolveError>> + Send {
        (**self).resolve(host)
    }
}

impl<R: BlockingResolve> BlockingResolve for Arc<R> {}

impl<R: Resolve> Resolve for &R {
    fn resolve(
        &self,
        host: &str,
    ) -> impl Future<Output = Result<ResolvedAddress, ResolveError>> + Send {
        (**self).resolve(host)
    }
}

impl<R: BlockingResolve> BlockingResolve for &R {}
