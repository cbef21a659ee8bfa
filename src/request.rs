//! Incoming HTTP request type.

use std::net::SocketAddr;

use http::request::Parts;

/// An incoming HTTP request, lifted out of hyper's request head.
///
/// The gate never reads request bodies, so only the head is kept.
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) peer: Option<SocketAddr>,
}

impl Request {
    pub(crate) fn from_parts(parts: &Parts, peer: Option<SocketAddr>) -> Self {
        let query = parts.uri.query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        // Non-UTF-8 header values are dropped rather than lossily decoded.
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();

        Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            query,
            headers,
            peer,
        }
    }

    /// Builds a request by hand. Intended for exercising middleware and
    /// handlers without a socket.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, url::form_urlencoded::parse(q.as_bytes()).into_owned().collect()),
            None => (target, Vec::new()),
        };
        Self {
            method: method.to_owned(),
            path: path.to_owned(),
            query,
            headers: Vec::new(),
            peer: None,
        }
    }

    /// Appends a header. Chains, for hand-built requests.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Sets the socket peer address. Chains, for hand-built requests.
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn peer(&self) -> Option<SocketAddr> { self.peer }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of a percent-decoded query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Best-effort client address.
    ///
    /// The first entry of `x-forwarded-for` wins (the gate runs behind a
    /// proxy), then the socket peer, then the literal `"unknown"`.
    pub fn client_ip(&self) -> String {
        let forwarded = self.header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (forwarded, self.peer) {
            (Some(ip), _) => ip.to_owned(),
            (None, Some(peer)) => peer.ip().to_string(),
            (None, None) => "unknown".to_owned(),
        }
    }
}
