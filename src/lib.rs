//! The core of a Kademlia node hardened against Sybil attacks as described in
//! [S/Kademlia](https://doi.org/10.1109/ICPADS.2007.4447808).
//!
//! The crate covers the parts of a node that need no I/O:
//!
//! 1. Identities: an Ed25519 keypair whose [`NodeId`] (the BLAKE3 digest of the public key)
//!    meets a proof-of-work difficulty, making identities costly to mint in bulk. See
//!    [`puzzle`].
//! 2. Routing: a [`RoutingTable`] of 256 fixed capacity buckets indexed by XOR distance to the
//!    local key, with a k-closest query.
//! 3. Wire formats: binary codecs for [`Contact`]s and the [`message`] types, all decoding is
//!    bounds checked and never panics.
//! 4. Authentication: a per-peer [`Session`] gate that only lets payloads through once the peer
//!    has signed its session key with the identity key it claims.
//!
//! The transport, the socket handling and the dispatch loop feeding payloads into a
//! [`Protocol`] are left to the caller.
//!
//! ## Features
//!
//! - `codec`: a length-delimited [`tokio_util`] codec for [`Message`](message::Message)s.
//! - `sync`: a lock-guarded routing table and puzzle search on tokio's blocking pool.

#![cfg_attr(doc_cfg, feature(doc_cfg))]

#[cfg(feature = "codec")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "codec")))]
pub mod codec;
#[cfg(feature = "sync")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub mod sync;

mod core;
mod error;
mod protocol;

pub use crate::{
    core::{
        bits::{distance, leading_zero_bits, sort_by_distance, xor_bytes},
        contact::Contact,
        handshake::{HandshakeState, Inbound, Session},
        id::{NodeId, PrivateKey, PublicKey, Seed, Signature, X},
        message,
        puzzle,
        routing_table::{RoutingTable, UpdateResult, BUCKETS, DEFAULT_BUCKET_CAPACITY},
        traits::Wire,
    },
    error::{Error, Invalid, Result},
    protocol::{Config, Protocol, DEFAULT_K},
};
