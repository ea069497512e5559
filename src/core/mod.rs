//! Foundational and often-reused types.

pub(crate) mod bits;
pub(crate) mod contact;
pub(crate) mod handshake;
pub(crate) mod id;
pub mod message;
pub mod puzzle;
pub(crate) mod routing_table;
pub(crate) mod traits;
