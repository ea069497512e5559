//! The node-level protocol: identity, routing table and handshake gate in one place.

use std::net::SocketAddr;

use rand::{thread_rng, CryptoRng, RngCore};
use tracing::{debug, trace, warn};

use crate::{
    core::{
        contact::Contact,
        handshake::{Inbound, Session},
        id::{NodeId, PrivateKey, PublicKey, X},
        message::{FindNodeRequest, FindNodeResponse, HandshakePacket, Message},
        puzzle::{self, DEFAULT_C1, DEFAULT_C2},
        routing_table::{RoutingTable, UpdateResult, DEFAULT_BUCKET_CAPACITY},
    },
    error::{Error, Result},
};

/// The default number of contacts returned for a FIND_NODE query.
pub const DEFAULT_K: usize = 16;

/// Protocol configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The static puzzle difficulty a minted identity meets.
    pub c1: usize,
    /// The dynamic puzzle difficulty.
    pub c2: usize,
    /// The maximum number of contacts per bucket.
    pub bucket_capacity: usize,
    /// The number of contacts returned for a FIND_NODE query, at most 255.
    pub k: usize,
    /// An existing identity, skips the static puzzle search when set.
    pub private_key: Option<PrivateKey>,
    /// Bytes both sides prefix the session key with before signing it.
    pub preamble: Option<Vec<u8>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            c1: DEFAULT_C1,
            c2: DEFAULT_C2,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            k: DEFAULT_K,
            private_key: None,
            preamble: None,
        }
    }
}

/// A node's view of the protocol.
///
/// The protocol performs no I/O: the transport hands it decoded payloads along with a
/// [`Session`] for the sender and sends whatever bytes it produces.
#[derive(Debug, Clone)]
pub struct Protocol {
    config: Config,
    private_key: PrivateKey,
    table: RoutingTable,
}

impl Protocol {
    /// Creates a new protocol instance, minting an identity if the config doesn't supply one.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_rng(config, &mut thread_rng())
    }

    /// Creates a new protocol instance drawing any randomness from `rng`.
    pub fn with_rng<R: RngCore + CryptoRng>(config: Config, rng: &mut R) -> Result<Self> {
        let private_key = match config.private_key {
            Some(private_key) => {
                private_key.validate()?;
                private_key
            }
            None => puzzle::solve_static(rng, config.c1)?.1,
        };

        let table = RoutingTable::new(private_key.public(), config.bucket_capacity);
        debug!(key = %private_key.public(), "protocol initialised");

        Ok(Self {
            config,
            private_key,
            table,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public()
    }

    pub fn private_key(&self) -> PrivateKey {
        self.private_key
    }

    pub fn node_id(&self) -> NodeId {
        self.public_key().node_id()
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut RoutingTable {
        &mut self.table
    }

    fn preamble(&self) -> Option<&[u8]> {
        self.config.preamble.as_deref()
    }

    /// Builds the handshake for an existing session key.
    pub fn handshake_packet(&self, session_key: PublicKey) -> HandshakePacket {
        HandshakePacket::new(&self.private_key, session_key, self.preamble())
    }

    /// Mints an ephemeral session key and the handshake announcing it.
    pub fn initiate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(PrivateKey, HandshakePacket)> {
        let session = PrivateKey::generate(rng)?;
        let packet = self.handshake_packet(session.public());

        Ok((session, packet))
    }

    /// Passes a payload from the session's peer through the handshake gate.
    pub fn read<'a>(&self, session: &mut Session, buf: &'a [u8]) -> Result<Inbound<'a>> {
        let inbound = session.read(buf, self.preamble())?;
        if let Inbound::Payload(payload) = inbound {
            trace!(addr = %session.addr(), len = payload.len(), "payload passed the gate");
        }

        Ok(inbound)
    }

    /// Passes a decoded [`Message`] from the session's peer through the handshake gate,
    /// returning it if it calls for higher-level handling.
    pub fn read_message(&self, session: &mut Session, message: Message) -> Result<Option<Message>> {
        session.read_message(message, self.preamble())
    }

    /// Verifies an already decoded handshake for the session's peer.
    pub fn handshake(&self, session: &mut Session, packet: &HandshakePacket) -> Result<()> {
        session.handshake(packet, self.preamble())
    }

    /// Records a contact in the routing table.
    pub fn update(&mut self, contact: Contact) -> Result<UpdateResult> {
        match self.table.update(contact) {
            UpdateResult::RejectedSelf => {
                warn!(addr = %contact.addr(), "peer announced our own key");
                Err(Error::SelfReference(*contact.public_key()))
            }
            UpdateResult::BucketFull => {
                debug!(key = %contact.public_key(), "bucket full, contact dropped");
                Ok(UpdateResult::BucketFull)
            }
            result => Ok(result),
        }
    }

    /// Records an authenticated peer under the address it reached us from.
    pub fn update_session(&mut self, session: &Session) -> Result<Option<UpdateResult>> {
        match session.peer_key() {
            Some(key) => self.update(Contact::new(key, session.addr())?).map(Some),
            None => Ok(None),
        }
    }

    /// Answers a FIND_NODE query from the local routing table.
    pub fn find_node(&self, request: &FindNodeRequest) -> FindNodeResponse {
        let k = self.config.k.min(FindNodeResponse::MAX_CONTACTS);
        let closest = self.table.closest_to(&request.target, k);

        FindNodeResponse::new(closest).unwrap_or_default()
    }

    /// Solves the dynamic puzzle for this node's identifier.
    pub fn puzzle_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<X> {
        puzzle::solve_dynamic(rng, &self.node_id(), self.config.c2)
    }

    /// Checks a peer's identity against both puzzle difficulties.
    pub fn verify_puzzles(&self, public_key: &PublicKey, x: &X) -> bool {
        let id = public_key.node_id();
        id.satisfies(self.config.c1) && x.satisfies(&id, self.config.c2)
    }

    /// Returns the address of the peer with the given key, if it is known.
    pub fn peer_addr(&self, key: &PublicKey) -> Option<SocketAddr> {
        self.table.get(key).map(Contact::addr)
    }
}
