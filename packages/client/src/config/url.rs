//! Proxy URL parsing: `scheme://[user[:pass]@]host:port`.

use crate::error::{self, Result};

use super::builder::ProxyConfigBuilder;
use super::proxy::ProxyType;

impl ProxyConfigBuilder {
    /// Pre-populates a builder from a proxy URL.
    ///
    /// Schemes `socks4a` and `socks5h` force remote DNS. Userinfo is
    /// percent-decoded. Path, query and fragment are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) when the URL does not
    /// parse, the scheme is unknown, or the host or port is missing.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| error::config(format!("Invalid proxy URL: {e}")))?;
        let (proxy_type, forced_rdns) = ProxyType::from_scheme(parsed.scheme())?;

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| error::config("Proxy URL has no host"))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| error::config(format!("Proxy URL for {host} has no port")))?;

        let mut builder = ProxyConfigBuilder::new(proxy_type).host(host).port(port);
        if !parsed.username().is_empty() {
            builder = builder.username(decode(parsed.username())?);
        }
        if let Some(password) = parsed.password() {
            builder = builder.password(decode(password)?);
        }
        if forced_rdns {
            builder = builder.rdns(true);
        }
        Ok(builder)
    }
}

fn decode(component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| error::config("Proxy URL credentials are not valid UTF-8"))
}
