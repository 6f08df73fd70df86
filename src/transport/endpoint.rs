//! Socket endpoint resolution.
//!
//! Derives the WebSocket endpoint from whatever backend address the caller
//! has configured: an HTTP(S) base URL, an address that is already a socket
//! URL, or a bare `host:port`.
//!
//! | Input | Endpoint |
//! |-------|----------|
//! | `https://host:8443/api` | `wss://host:8443/ws` |
//! | `http://host:3000` | `ws://host:3000/ws` |
//! | `wss://host/ws` | `wss://host/ws` |
//! | `192.168.0.115:3000` | `ws://192.168.0.115:3000/ws` |
//!
//! Resolution never fails. Input that cannot be parsed as a URL goes through
//! literal prefix substitution instead; if the result is still unusable, the
//! transport reports it when it tries to open the link.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Path the backend serves its socket on.
pub const DEFAULT_ENDPOINT_PATH: &str = "/ws";

// ============================================================================
// Scheme
// ============================================================================

/// Socket scheme of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `wss://`
    Secure,
    /// `ws://`
    Insecure,
}

impl Scheme {
    /// Returns the URL scheme string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secure => "wss",
            Self::Insecure => "ws",
        }
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Resolved socket endpoint.
///
/// Built once per `connect` call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    path: String,
}

impl Endpoint {
    /// Resolves a backend address using [`DEFAULT_ENDPOINT_PATH`].
    #[must_use]
    pub fn resolve(address: &str) -> Self {
        Self::resolve_with_path(address, DEFAULT_ENDPOINT_PATH)
    }

    /// Resolves a backend address, appending `path` as the socket path.
    #[must_use]
    pub fn resolve_with_path(address: &str, path: &str) -> Self {
        let address = address.trim();
        let path = normalize_path(path);

        Self::from_url(address, &path).unwrap_or_else(|| Self::from_literal(address, &path))
    }

    /// Structured resolution: swap the scheme, keep host and port, replace the path.
    fn from_url(address: &str, path: &str) -> Option<Self> {
        let url = Url::parse(address).ok()?;

        let scheme = match url.scheme() {
            "https" | "wss" => Scheme::Secure,
            "http" | "ws" => Scheme::Insecure,
            _ => return None,
        };

        let host = url.host_str().filter(|host| !host.is_empty())?;

        Some(Self {
            scheme,
            host: host.to_string(),
            port: url.port(),
            path: path.to_string(),
        })
    }

    /// Fallback resolution by literal prefix substitution.
    fn from_literal(address: &str, path: &str) -> Self {
        let (scheme, rest, keep_suffix) = if let Some(rest) = address.strip_prefix("http://") {
            (Scheme::Insecure, rest, false)
        } else if let Some(rest) = address.strip_prefix("https://") {
            (Scheme::Secure, rest, false)
        } else if let Some(rest) = address.strip_prefix("ws://") {
            (Scheme::Insecure, rest, true)
        } else if let Some(rest) = address.strip_prefix("wss://") {
            (Scheme::Secure, rest, true)
        } else {
            (Scheme::Insecure, address, false)
        };

        let target = if keep_suffix && rest.ends_with(path) {
            rest.to_string()
        } else {
            format!("{rest}{path}")
        };

        let (authority, path) = match target.find('/') {
            Some(index) => target.split_at(index),
            None => (target.as_str(), ""),
        };
        let (host, port) = split_authority(authority);

        Self {
            scheme,
            host,
            port,
            path: path.to_string(),
        }
    }

    /// Returns the socket scheme.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns `true` for `wss://` endpoints.
    #[inline]
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        matches!(self.scheme, Scheme::Secure)
    }

    /// Returns the host (IPv6 hosts keep their brackets).
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the explicit port, if any.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns the socket path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the endpoint as a URL string.
    #[inline]
    #[must_use]
    pub fn as_url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Splits `host[:port]`, leaving the whole authority as host when the
/// suffix is not a valid port.
fn split_authority(authority: &str) -> (String, Option<u16>) {
    if let Some((host, port)) = authority.rsplit_once(':')
        && !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit())
        && let Ok(port) = port.parse::<u16>()
    {
        return (host.to_string(), Some(port));
    }
    (authority.to_string(), None)
}

// ============================================================================
// Tests
// ============================================================================
