//! Error types.

use std::net::SocketAddr;

use thiserror::Error;

use crate::core::id::PublicKey;

/// A convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The reasons a record can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Invalid {
    #[error("host is not a valid ipv4 or ipv6 address: host ip is {0} byte(s)")]
    HostLength(usize),
    #[error("port cannot be 0")]
    ZeroPort,
    #[error("unknown address family flag {0}")]
    AddressFamily(u8),
    #[error("{0} contacts exceed the 255 a response can carry")]
    TooManyContacts(usize),
}

/// Errors surfaced by the identity, codec, routing and handshake layers.
#[derive(Debug, Error)]
pub enum Error {
    /// The input ended before a fixed or length-prefixed field could be read.
    #[error("unexpected end of input: needed {needed} byte(s), {remaining} remaining")]
    DecodeTruncated { needed: usize, remaining: usize },

    /// A fixed-size packet was followed by extra bytes.
    #[error("expected exactly {expected} byte(s), got {actual}")]
    DecodeTrailing { expected: usize, actual: usize },

    /// A nested record failed to decode.
    #[error("failed to decode contact {index}")]
    DecodeNested {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// The message tag doesn't correspond to a known packet.
    #[error("unknown message tag {0}")]
    UnknownMessage(u8),

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] Invalid),

    #[error("{addr}: invalid signature on handshake packet")]
    SignatureInvalid { addr: SocketAddr },

    /// A peer sent something other than a handshake before authenticating.
    #[error("{addr}: {message} received before the handshake")]
    Unauthenticated {
        addr: SocketAddr,
        message: &'static str,
    },

    /// The randomness source failed while searching for a puzzle solution.
    #[error("failed to generate {puzzle} in puzzle search")]
    PuzzleGenerationFailed {
        puzzle: &'static str,
        #[source]
        source: rand::Error,
    },

    /// The puzzle search was cancelled or its worker went away before finding a solution.
    #[error("puzzle search aborted")]
    PuzzleAborted,

    #[error("{0} is the local identity")]
    SelfReference(PublicKey),

    /// The public half of a private key doesn't match its seed.
    #[error("private key is malformed")]
    InvalidPrivateKey,
}

impl Error {
    pub(crate) fn truncated(needed: usize, remaining: usize) -> Self {
        Error::DecodeTruncated { needed, remaining }
    }

    /// Returns `true` if the error was caused by malformed or short input.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::DecodeTruncated { .. }
                | Error::DecodeTrailing { .. }
                | Error::DecodeNested { .. }
                | Error::UnknownMessage(_)
                | Error::ValidationFailed(_)
        )
    }
}
