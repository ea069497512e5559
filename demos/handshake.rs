//! Two nodes on loopback UDP authenticate each other and exchange a FIND_NODE query.
//!
//! Run with `RUST_LOG=debug cargo run --example handshake` to see the protocol's own events.

use std::{error::Error, net::SocketAddr};

use rand::thread_rng;
use skademlia::{
    message::{FindNodeRequest, Message},
    Config, Contact, PrivateKey, Protocol, Session, Wire,
};
use tokio::net::UdpSocket;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const PREAMBLE: &[u8] = b"skademlia-demo";

struct Node {
    name: &'static str,
    protocol: Protocol,
    socket: UdpSocket,
    session: Option<Session>,
}

impl Node {
    async fn new(name: &'static str) -> Result<Self, Box<dyn Error>> {
        let protocol = Protocol::new(Config {
            c1: 8,
            c2: 8,
            preamble: Some(PREAMBLE.to_vec()),
            ..Default::default()
        })?;
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        info!(
            node = name,
            addr = %socket.local_addr()?,
            id = %protocol.node_id(),
            "node started"
        );

        Ok(Self {
            name,
            protocol,
            socket,
            session: None,
        })
    }

    async fn send(&self, to: SocketAddr, message: Message) -> Result<(), Box<dyn Error>> {
        info!(node = self.name, %to, kind = message.variant_as_str(), "sending");
        self.socket.send_to(&message.to_bytes(), to).await?;

        Ok(())
    }

    async fn hello(&self, to: SocketAddr) -> Result<(), Box<dyn Error>> {
        let (_, packet) = self.protocol.initiate(&mut thread_rng())?;
        self.send(to, Message::Handshake(packet)).await
    }

    /// Receives one datagram and handles it, returning the sender and any reply.
    async fn recv(&mut self) -> Result<(SocketAddr, Option<Message>), Box<dyn Error>> {
        let mut buf = vec![0u8; 65_535];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        let session = self.session.get_or_insert_with(|| Session::new(from));

        let (message, _) = Message::decode(&buf[..len])?;
        info!(node = self.name, %from, kind = message.variant_as_str(), "received");

        let reply = match self.protocol.read_message(session, message)? {
            // The handshake was consumed by the gate.
            None => {
                self.protocol.update_session(session)?;
                None
            }
            Some(Message::FindNode(request)) => {
                Some(Message::Nodes(self.protocol.find_node(&request)))
            }
            Some(Message::Nodes(response)) => {
                for contact in response.into_closest() {
                    self.protocol.update(contact)?;
                }
                None
            }
            Some(Message::Handshake(_)) => None,
        };

        Ok((from, reply))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut alice = Node::new("alice").await?;
    let mut bob = Node::new("bob").await?;
    let (alice_addr, bob_addr) = (alice.socket.local_addr()?, bob.socket.local_addr()?);

    // Bob knows a few peers Alice hasn't heard of yet.
    for port in 7000..7008 {
        let key = PrivateKey::generate(&mut thread_rng())?.public();
        bob.protocol
            .update(Contact::new(key, SocketAddr::from(([127, 0, 0, 1], port)))?)?;
    }

    alice.hello(bob_addr).await?;
    bob.recv().await?;
    bob.hello(alice_addr).await?;
    alice.recv().await?;

    let target = alice.protocol.public_key();
    alice
        .send(bob_addr, Message::FindNode(FindNodeRequest { target }))
        .await?;

    if let (from, Some(reply)) = bob.recv().await? {
        bob.send(from, reply).await?;
    }
    alice.recv().await?;

    info!(
        alice = alice.protocol.table().len(),
        bob = bob.protocol.table().len(),
        "known contacts"
    );

    Ok(())
}
