//! One negotiation attempt.
//!
//! A [`NegotiationSession`] owns the transport from the moment the proxy
//! socket is attached until the route is negotiated. On success the stream
//! is handed back to the caller; on any failure it is closed before the error
//! is returned, so a half-negotiated stream never escapes.

use std::time::Instant;

use crate::config::{ConnectConfig, DestinationTarget, ProxyHop};
use crate::dns::Resolve;
use crate::error::{self, Result};

use super::negotiate::{NegotiationState, create_negotiator};
use super::transport::ByteStream;

/// Per-attempt negotiation state machine.
#[derive(Debug)]
pub struct NegotiationSession<'a, S> {
    route: &'a [ProxyHop],
    target: &'a DestinationTarget,
    stream: Option<S>,
    state: NegotiationState,
    started: Instant,
}

impl<'a, S: ByteStream> NegotiationSession<'a, S> {
    /// Starts a session for `route` (first hop first) towards `target`.
    pub fn new(route: &'a [ProxyHop], target: &'a DestinationTarget) -> Self {
        Self {
            route,
            target,
            stream: None,
            state: NegotiationState::Unconnected,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Hands the freshly connected proxy socket to the session.
    pub fn attach(&mut self, stream: S) {
        self.stream = Some(stream);
        self.enter(NegotiationState::ProxyConnected, 0);
    }

    /// Negotiates every hop and returns the tunnelled stream.
    ///
    /// # Errors
    ///
    /// Returns the first negotiator or transport error unchanged, after the
    /// stream has been closed. `Config` if no stream was attached or the
    /// route is empty.
    pub async fn negotiate<R: Resolve>(mut self, resolver: &R, config: &ConnectConfig) -> Result<S> {
        let Some(mut stream) = self.stream.take() else {
            self.enter(NegotiationState::Failed, 0);
            return Err(error::config("Negotiation started without a proxy connection"));
        };

        match self.run_route(&mut stream, resolver, config).await {
            Ok(()) => {
                self.enter(NegotiationState::Negotiated, self.route.len().saturating_sub(1));
                tracing::info!(
                    target: "sockhop::session",
                    destination = %self.target,
                    hops = self.route.len(),
                    elapsed_ms = self.started.elapsed().as_millis() as u64,
                    "proxy tunnel established"
                );
                Ok(stream)
            }
            Err(e) => {
                self.enter(NegotiationState::Failed, 0);
                tracing::warn!(
                    target: "sockhop::session",
                    destination = %self.target,
                    error.kind = e.kind_name(),
                    error = %e,
                    "proxy negotiation failed"
                );
                stream.close().await;
                Err(e)
            }
        }
    }

    async fn run_route<R: Resolve>(
        &mut self,
        stream: &mut S,
        resolver: &R,
        config: &ConnectConfig,
    ) -> Result<()> {
        if self.route.is_empty() {
            return Err(error::config("Proxy route is empty"));
        }

        for (index, hop) in self.route.iter().enumerate() {
            let next = match self.route.get(index + 1) {
                Some(next_hop) => next_hop.endpoint.target(),
                None => self.target.clone(),
            };
            let negotiator = create_negotiator(hop.proxy_type, &hop.endpoint).with_limits(config);

            if index > 0 {
                self.enter(NegotiationState::ProxyConnected, index);
            }
            negotiator.authenticate(stream).await?;
            self.enter(NegotiationState::Authenticated, index);
            negotiator.request(stream, resolver, &next).await?;
        }
        Ok(())
    }

    fn enter(&mut self, state: NegotiationState, hop: usize) {
        tracing::debug!(
            target: "sockhop::session",
            from = self.state.as_str(),
            to = state.as_str(),
            hop,
            proxy = ?self.route.get(hop).map(|h| h.endpoint.to_string()),
            "negotiation state change"
        );
        self.state = state;
    }
}
