use std::net::SocketAddr;

use rand::{thread_rng, Rng};
use skademlia::{Config, Contact, PrivateKey, Protocol, PublicKey};
use tracing_subscriber::{fmt, EnvFilter};

#[allow(dead_code)]
pub fn enable_tracing() {
    fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// Puzzle difficulties low enough to mint identities instantly.
#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        c1: 4,
        c2: 4,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn protocol(preamble: Option<&[u8]>) -> Protocol {
    Protocol::new(Config {
        preamble: preamble.map(<[u8]>::to_vec),
        ..test_config()
    })
    .unwrap()
}

#[allow(dead_code)]
pub fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{}", port).parse().unwrap()
}

#[allow(dead_code)]
pub fn rand_key() -> PublicKey {
    PrivateKey::generate(&mut thread_rng()).unwrap().public()
}

#[allow(dead_code)]
pub fn rand_contact() -> Contact {
    let port = thread_rng().gen_range(1..=u16::MAX);
    Contact::new(rand_key(), addr(port)).unwrap()
}

/// A key landing in bucket `i` of a table centered on `local`.
#[allow(dead_code)]
pub fn key_in_bucket(local: &PublicKey, i: usize) -> PublicKey {
    let mut rng = thread_rng();
    let mut bytes = local.to_bytes();

    // Keep the first `i` bits, flip bit `i` and randomise the rest.
    let (byte, bit) = (i / 8, i % 8);
    bytes[byte] ^= 0x80 >> bit;
    let mask = (0x80u8 >> bit).wrapping_sub(1);
    bytes[byte] = (bytes[byte] & !mask) | (rng.gen::<u8>() & mask);
    for b in bytes.iter_mut().skip(byte + 1) {
        *b = rng.gen();
    }

    PublicKey::new(bytes)
}
