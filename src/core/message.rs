//! Protocol message types.

use bytes::BufMut;

use crate::{
    core::{
        contact::Contact,
        id::{PrivateKey, PublicKey, Signature},
        traits::{split_array, Wire},
    },
    error::{Error, Invalid, Result},
};

/// Builds the message a handshake signature covers: the preamble, if any, followed by the
/// session key.
pub fn handshake_message(session_key: &PublicKey, preamble: Option<&[u8]>) -> Vec<u8> {
    let preamble = preamble.unwrap_or_default();
    let mut msg = Vec::with_capacity(preamble.len() + PublicKey::SIZE);
    msg.extend_from_slice(preamble);
    msg.extend_from_slice(session_key.as_bytes());
    msg
}

/// The data making up a HANDSHAKE message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakePacket {
    /// The key the sender claims as its identity.
    pub public_key: PublicKey,
    /// The sender's ephemeral key for this session.
    pub session_key: PublicKey,
    /// The identity key's signature over the session key.
    pub signature: Signature,
}

impl HandshakePacket {
    /// The exact encoded size of a handshake.
    pub const SIZE: usize = 2 * PublicKey::SIZE + Signature::SIZE;

    /// Signs `session_key` with the identity key.
    pub fn new(private_key: &PrivateKey, session_key: PublicKey, preamble: Option<&[u8]>) -> Self {
        Self {
            public_key: private_key.public(),
            session_key,
            signature: private_key.sign(&handshake_message(&session_key, preamble)),
        }
    }

    /// Returns `true` if the signature was produced by the claimed key.
    pub fn verify(&self, preamble: Option<&[u8]>) -> bool {
        self.signature.verify(
            &self.public_key,
            &handshake_message(&self.session_key, preamble),
        )
    }
}

impl Wire for HandshakePacket {
    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(self.public_key.as_bytes());
        dst.put_slice(self.session_key.as_bytes());
        dst.put_slice(self.signature.as_bytes());
    }

    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        match src.len() {
            len if len < Self::SIZE => return Err(Error::truncated(Self::SIZE, len)),
            len if len > Self::SIZE => {
                return Err(Error::DecodeTrailing {
                    expected: Self::SIZE,
                    actual: len,
                })
            }
            _ => {}
        }

        let (public_key, src) = split_array::<{ PublicKey::SIZE }>(src)?;
        let (session_key, src) = split_array::<{ PublicKey::SIZE }>(src)?;
        let (signature, src) = split_array::<{ Signature::SIZE }>(src)?;

        let packet = Self {
            public_key: PublicKey::new(public_key),
            session_key: PublicKey::new(session_key),
            signature: Signature::new(signature),
        };

        Ok((packet, src))
    }
}

/// The data making up a FIND_NODE message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindNodeRequest {
    pub target: PublicKey,
}

impl FindNodeRequest {
    pub const SIZE: usize = PublicKey::SIZE;
}

impl Wire for FindNodeRequest {
    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(self.target.as_bytes());
    }

    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (target, src) = split_array::<{ PublicKey::SIZE }>(src)?;

        Ok((
            Self {
                target: PublicKey::new(target),
            },
            src,
        ))
    }
}

/// The data making up a NODES message, the answer to FIND_NODE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindNodeResponse {
    closest: Vec<Contact>,
}

impl FindNodeResponse {
    /// The most contacts a response can carry, the count is a single byte on the wire.
    pub const MAX_CONTACTS: usize = u8::MAX as usize;

    pub fn new(closest: Vec<Contact>) -> Result<Self> {
        if closest.len() > Self::MAX_CONTACTS {
            return Err(Invalid::TooManyContacts(closest.len()).into());
        }

        Ok(Self { closest })
    }

    pub fn closest(&self) -> &[Contact] {
        &self.closest
    }

    pub fn into_closest(self) -> Vec<Contact> {
        self.closest
    }
}

impl Wire for FindNodeResponse {
    fn encode<B: BufMut>(&self, dst: &mut B) {
        debug_assert!(self.closest.len() <= Self::MAX_CONTACTS);

        dst.put_u8(self.closest.len() as u8);
        for contact in &self.closest {
            contact.encode(dst);
        }
    }

    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (count, mut src) = split_array::<1>(src)?;
        let count = count[0] as usize;

        let mut closest = Vec::with_capacity(count);
        for index in 0..count {
            let (contact, rest) = Contact::decode(src).map_err(|e| Error::DecodeNested {
                index,
                source: Box::new(e),
            })?;
            closest.push(contact);
            src = rest;
        }

        Ok((Self { closest }, src))
    }
}

/// Message variants, each encoded behind a one byte tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// HANDSHAKE authenticates the sender's identity key.
    Handshake(HandshakePacket),
    /// FIND_NODE queries a peer for the contacts closest to a key.
    FindNode(FindNodeRequest),
    /// NODES is the correct response to FIND_NODE.
    Nodes(FindNodeResponse),
}

impl Message {
    const TAG_HANDSHAKE: u8 = 0;
    const TAG_FIND_NODE: u8 = 1;
    const TAG_NODES: u8 = 2;

    pub fn variant_as_str(&self) -> &'static str {
        match self {
            Message::Handshake(_) => "handshake",
            Message::FindNode(_) => "find_node",
            Message::Nodes(_) => "nodes",
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Message::Nodes(_))
    }
}

impl Wire for Message {
    fn encode<B: BufMut>(&self, dst: &mut B) {
        match self {
            Message::Handshake(packet) => {
                dst.put_u8(Self::TAG_HANDSHAKE);
                packet.encode(dst);
            }
            Message::FindNode(request) => {
                dst.put_u8(Self::TAG_FIND_NODE);
                request.encode(dst);
            }
            Message::Nodes(response) => {
                dst.put_u8(Self::TAG_NODES);
                response.encode(dst);
            }
        }
    }

    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        let (tag, src) = split_array::<1>(src)?;

        match tag[0] {
            Self::TAG_HANDSHAKE => {
                // Handshakes are fixed size, so they must be the last thing in the buffer.
                HandshakePacket::decode(src).map(|(packet, src)| (Message::Handshake(packet), src))
            }
            Self::TAG_FIND_NODE => {
                FindNodeRequest::decode(src).map(|(request, src)| (Message::FindNode(request), src))
            }
            Self::TAG_NODES => {
                FindNodeResponse::decode(src).map(|(response, src)| (Message::Nodes(response), src))
            }
            tag => Err(Error::UnknownMessage(tag)),
        }
    }
}
