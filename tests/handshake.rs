use rand::thread_rng;
use skademlia::{
    message::{FindNodeRequest, HandshakePacket, Message},
    Error, HandshakeState, Inbound, Session, Signature, UpdateResult, Wire,
};

mod common;
#[allow(unused_imports)]
use crate::common::{addr, enable_tracing, protocol, rand_contact};

#[test]
fn mutual_handshake() {
    // enable_tracing();

    let preamble = Some(&b"skademlia/1"[..]);
    let mut a = protocol(preamble);
    let mut b = protocol(preamble);

    // Each side tracks the other under the address it hears from.
    let mut a_session = Session::new(addr(2000));
    let mut b_session = Session::new(addr(1000));

    let (_, a_hello) = a.initiate(&mut thread_rng()).unwrap();
    let (_, b_hello) = b.initiate(&mut thread_rng()).unwrap();
    let a_bytes = a_hello.to_bytes();
    let b_bytes = b_hello.to_bytes();

    assert_eq!(
        b.read(&mut b_session, &a_bytes).unwrap(),
        Inbound::Handshake(a.public_key())
    );
    assert_eq!(
        a.read(&mut a_session, &b_bytes).unwrap(),
        Inbound::Handshake(b.public_key())
    );

    assert_eq!(
        b.update_session(&b_session).unwrap(),
        Some(UpdateResult::Inserted)
    );
    assert_eq!(
        a.update_session(&a_session).unwrap(),
        Some(UpdateResult::Inserted)
    );

    assert_eq!(a.peer_addr(&b.public_key()), Some(addr(2000)));
    assert_eq!(b.peer_addr(&a.public_key()), Some(addr(1000)));

    // A second handshake refreshes rather than duplicates.
    assert_eq!(
        b.update_session(&b_session).unwrap(),
        Some(UpdateResult::Refreshed)
    );
    assert_eq!(b.table().len(), 1);
}

#[test]
fn find_node_after_handshake() {
    let mut a = protocol(None);
    let mut b = protocol(None);

    for _ in 0..64 {
        b.update(rand_contact()).unwrap();
    }

    let mut session = Session::new(addr(1000));
    let (_, hello) = a.initiate(&mut thread_rng()).unwrap();
    let hello = hello.to_bytes();
    b.read(&mut session, &hello).unwrap();

    // The peer is authenticated, so its request passes the gate untouched.
    let request = Message::FindNode(FindNodeRequest {
        target: a.public_key(),
    })
    .to_bytes();

    let payload = match b.read(&mut session, &request).unwrap() {
        Inbound::Payload(payload) => payload,
        inbound => panic!("unexpected {:?}", inbound),
    };

    let response = match Message::decode(payload).unwrap() {
        (Message::FindNode(request), rest) if rest.is_empty() => b.find_node(&request),
        (message, _) => panic!("unexpected {}", message.variant_as_str()),
    };
    assert_eq!(
        response.closest(),
        b.table().closest_to(&a.public_key(), b.config().k).as_slice()
    );

    // A decodes the answer and learns about the peers.
    let bytes = Message::Nodes(response.clone()).to_bytes();
    let nodes = match Message::decode(&bytes).unwrap() {
        (Message::Nodes(nodes), rest) if rest.is_empty() => nodes,
        (message, _) => panic!("unexpected {}", message.variant_as_str()),
    };
    assert_eq!(nodes, response);

    for contact in nodes.into_closest() {
        assert!(a.update(contact).is_ok());
    }
    assert!(a.table().len() <= response.closest().len());
    assert!(!a.table().is_empty());
}

#[test]
fn forged_handshake_is_rejected() {
    let a = protocol(None);
    let b = protocol(None);
    let mallory = protocol(None);

    // Mallory claims to be A but can only sign with its own key.
    let (_, signed_by_mallory) = mallory.initiate(&mut thread_rng()).unwrap();
    let forged = HandshakePacket {
        public_key: a.public_key(),
        ..signed_by_mallory
    };
    let forged = forged.to_bytes();

    let mut session = Session::new(addr(6666));
    let err = b.read(&mut session, &forged).unwrap_err();
    assert!(matches!(err, Error::SignatureInvalid { addr } if addr.port() == 6666));
    assert_eq!(session.state(), HandshakeState::Unauthenticated);
}

#[test]
fn zero_signature_is_rejected() {
    let a = protocol(None);
    let b = protocol(None);

    let (_, hello) = a.initiate(&mut thread_rng()).unwrap();
    let zeroed = HandshakePacket {
        signature: Signature::ZERO,
        ..hello
    };

    let mut session = Session::new(addr(1));
    assert!(b.handshake(&mut session, &zeroed).is_err());
    assert!(!session.is_authenticated());
}

#[test]
fn payloads_before_handshake_are_rejected() {
    let b = protocol(None);
    let mut session = Session::new(addr(1));

    let request = Message::FindNode(FindNodeRequest {
        target: b.public_key(),
    })
    .to_bytes();

    let err = b.read(&mut session, &request).unwrap_err();
    assert!(err.is_decode());
    assert!(!session.is_authenticated());
}

#[test]
fn handshake_with_trailing_bytes_is_rejected() {
    let a = protocol(None);
    let b = protocol(None);

    let (_, hello) = a.initiate(&mut thread_rng()).unwrap();
    let mut bytes = hello.to_bytes().to_vec();
    bytes.push(0);

    let mut session = Session::new(addr(1));
    assert!(matches!(
        b.read(&mut session, &bytes),
        Err(Error::DecodeTrailing {
            expected: HandshakePacket::SIZE,
            ..
        })
    ));
    assert!(!session.is_authenticated());
}

#[test]
fn tagged_handshake_passes_the_gate() {
    let preamble = Some(&b"skademlia/1"[..]);
    let a = protocol(preamble);
    let b = protocol(preamble);

    // What a framed stream delivers: the tag byte followed by the packet.
    let (_, hello) = a.initiate(&mut thread_rng()).unwrap();
    let bytes = Message::Handshake(hello).to_bytes();
    assert_eq!(bytes.len(), HandshakePacket::SIZE + 1);

    let (message, rest) = Message::decode(&bytes).unwrap();
    assert!(rest.is_empty());

    let mut session = Session::new(addr(3000));
    assert_eq!(b.read_message(&mut session, message).unwrap(), None);
    assert_eq!(session.peer_key(), Some(a.public_key()));

    // Requests now pass through for handling.
    let request = Message::FindNode(FindNodeRequest {
        target: b.public_key(),
    });
    assert_eq!(
        b.read_message(&mut session, request.clone()).unwrap(),
        Some(request)
    );
}

#[test]
fn tagged_request_before_handshake_is_refused() {
    let b = protocol(None);
    let mut session = Session::new(addr(3001));

    let request = Message::FindNode(FindNodeRequest {
        target: b.public_key(),
    });
    assert!(matches!(
        b.read_message(&mut session, request),
        Err(Error::Unauthenticated { addr, message: "find_node" }) if addr.port() == 3001
    ));
    assert!(!session.is_authenticated());
}
