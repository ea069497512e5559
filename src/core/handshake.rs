//! The per-peer handshake gate.

use std::net::SocketAddr;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    core::{
        id::PublicKey,
        message::{HandshakePacket, Message},
        traits::Wire,
    },
    error::{Error, Result},
};

/// The authentication state of a single remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No valid handshake has been received yet.
    Unauthenticated,
    /// The peer proved ownership of its identity key. Terminal.
    Authenticated {
        public_key: PublicKey,
        session_key: PublicKey,
        since: OffsetDateTime,
    },
}

/// What a payload turned out to be once it passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// The payload was a valid handshake, the peer is now authenticated under this key.
    Handshake(PublicKey),
    /// The peer is authenticated, the payload is for higher-level handling.
    Payload(&'a [u8]),
}

/// Tracks whether a remote peer has authenticated.
///
/// Until a handshake verifies, every payload is treated as a handshake attempt. Once it has,
/// payloads pass through untouched; there is no way back to the unauthenticated state.
#[derive(Debug, Clone)]
pub struct Session {
    addr: SocketAddr,
    state: HandshakeState,
}

impl Session {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            state: HandshakeState::Unauthenticated,
        }
    }

    /// Returns the remote address this session belongs to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, HandshakeState::Authenticated { .. })
    }

    /// Returns the peer's identity key once it has authenticated.
    pub fn peer_key(&self) -> Option<PublicKey> {
        match self.state {
            HandshakeState::Authenticated { public_key, .. } => Some(public_key),
            HandshakeState::Unauthenticated => None,
        }
    }

    /// Verifies a handshake and authenticates the peer if it checks out.
    ///
    /// The signature must cover the session key, prefixed by `preamble` if one is configured.
    /// An already authenticated session ignores further handshakes.
    pub fn handshake(&mut self, packet: &HandshakePacket, preamble: Option<&[u8]>) -> Result<()> {
        if self.is_authenticated() {
            debug!(addr = %self.addr, "ignoring handshake on an authenticated session");
            return Ok(());
        }

        if !packet.verify(preamble) {
            warn!(addr = %self.addr, key = %packet.public_key, "invalid signature on handshake packet");
            return Err(Error::SignatureInvalid { addr: self.addr });
        }

        self.state = HandshakeState::Authenticated {
            public_key: packet.public_key,
            session_key: packet.session_key,
            since: OffsetDateTime::now_utc(),
        };
        debug!(addr = %self.addr, key = %packet.public_key, "peer authenticated");

        Ok(())
    }

    /// Passes a payload through the gate.
    pub fn read<'a>(&mut self, payload: &'a [u8], preamble: Option<&[u8]>) -> Result<Inbound<'a>> {
        if self.is_authenticated() {
            return Ok(Inbound::Payload(payload));
        }

        let (packet, _) = HandshakePacket::decode(payload)?;
        self.handshake(&packet, preamble)?;

        Ok(Inbound::Handshake(packet.public_key))
    }

    /// Passes a decoded [`Message`] through the gate.
    ///
    /// Handshakes are consumed and yield `None`. Any other message is handed back once the peer
    /// has authenticated and refused before that.
    pub fn read_message(
        &mut self,
        message: Message,
        preamble: Option<&[u8]>,
    ) -> Result<Option<Message>> {
        match message {
            Message::Handshake(packet) => {
                self.handshake(&packet, preamble)?;
                Ok(None)
            }
            message if self.is_authenticated() => Ok(Some(message)),
            message => {
                debug!(addr = %self.addr, kind = message.variant_as_str(), "dropping message from unauthenticated peer");
                Err(Error::Unauthenticated {
                    addr: self.addr,
                    message: message.variant_as_str(),
                })
            }
        }
    }
}
