use super::types::Error;

impl Error {
    /// Returns true if the connect deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if the proxy rejected the request or replied with garbage.
    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self, Error::Proxy { .. })
    }

    /// Returns true if the socket to the proxy could not be opened or broke.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if DNS resolution failed.
    #[must_use]
    pub fn is_resolve(&self) -> bool {
        matches!(self, Error::Resolve(_))
    }

    /// Returns true if the configuration was rejected.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Returns true if the destination TLS handshake failed.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        matches!(self, Error::Tls { .. })
    }

    /// The proxy's status code: SOCKS reply code or HTTP status.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Proxy { code, .. } => *code,
            _ => None,
        }
    }

    /// The raw OS error number behind a connection failure.
    #[must_use]
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Error::Connection { os_code, .. } => *os_code,
            _ => None,
        }
    }

    /// Short stable name of the variant, used as a structured log field.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Proxy { .. } => "proxy",
            Error::Connection { .. } => "connection",
            Error::Timeout { .. } => "timeout",
            Error::Resolve(_) => "resolve",
            Error::Config(_) => "config",
            Error::Tls { .. } => "tls",
        }
    }
}
