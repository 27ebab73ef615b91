//! Opaque relay payloads and the identity scheme for connected clients.
//!
//! The relay never interprets message contents; a [`Payload`] is just a
//! reference-counted blob so that fanning one message out to N peers clones
//! pointers, not bytes.

use bytes::Bytes;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Placeholder delivered in place of an empty payload.
pub const EMPTY_PAYLOAD_PLACEHOLDER: &str = "N/A";

/// Registry key for a connection, derived from the remote address and port.
///
/// Two concurrent connections never share an identity as long as the peer's
/// `address:port` pair is unique, which TCP guarantees for live sockets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Arc<str>);

impl ClientId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for ClientId {
    fn from(addr: SocketAddr) -> Self {
        Self(Arc::from(format!("{}:{}", addr.ip(), addr.port())))
    }
}

impl From<&str> for ClientId {
    fn from(identity: &str) -> Self {
        Self(Arc::from(identity))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque message payload, relayed verbatim between peers.
///
/// Cloning is cheap for both variants (`Arc` / `Bytes` refcount bump).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(Arc<str>),
    Binary(Bytes),
}

impl Payload {
    /// Build a text payload from anything string-like.
    pub fn text(contents: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(contents.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace an absent/empty payload with the `"N/A"` placeholder.
    ///
    /// Empty frames are relayed as a sentinel rather than rejected, so peers
    /// always see a non-empty message.
    #[must_use]
    pub fn normalize(self) -> Self {
        if self.is_empty() {
            Self::Text(Arc::from(EMPTY_PAYLOAD_PLACEHOLDER))
        } else {
            self
        }
    }
}
