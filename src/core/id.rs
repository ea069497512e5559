//! Keys, signatures and the identifiers derived from them.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::{CryptoRng, RngCore};

use crate::{
    core::bits::{leading_zero_bits, xor_bytes},
    error::{Error, Result},
};

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $size]);

        impl $name {
            /// The size in bytes.
            pub const SIZE: usize = $size;

            /// The all-zero value, reserved to mean "absent".
            pub const ZERO: Self = Self([0u8; $size]);

            pub const fn new(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn to_bytes(self) -> [u8; $size] {
                self.0
            }

            /// Returns `true` if this is the all-zero sentinel.
            pub fn is_zero(&self) -> bool {
                *self == Self::ZERO
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }
    };
}

macro_rules! hex_debug {
    ($($name:ident),*) => {
        $(
            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}({})", stringify!($name), self)
                }
            }
        )*
    };
}

// Secret material never shows up in debug output, hex is only available through `Display`.
macro_rules! redacted_debug {
    ($($name:ident),*) => {
        $(
            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}(<redacted>)", stringify!($name))
                }
            }
        )*
    };
}

fixed_bytes!(
    /// An Ed25519 public key, the identity a peer is known by.
    PublicKey,
    32
);
fixed_bytes!(
    /// The secret half of a keypair.
    Seed,
    32
);
fixed_bytes!(
    /// An Ed25519 private key: the [`Seed`] followed by the [`PublicKey`] derived from it.
    PrivateKey,
    64
);
fixed_bytes!(
    /// An Ed25519 signature.
    Signature,
    64
);
fixed_bytes!(
    /// The BLAKE3 digest of a [`PublicKey`].
    NodeId,
    32
);
fixed_bytes!(
    /// A dynamic puzzle solution for a [`NodeId`].
    X,
    32
);

hex_debug!(PublicKey, Signature, NodeId, X);
redacted_debug!(Seed, PrivateKey);

impl PublicKey {
    /// Derives the node identifier for this key. Always recomputed, never cached.
    pub fn node_id(&self) -> NodeId {
        NodeId(*blake3::hash(&self.0).as_bytes())
    }

    /// Verifies `signature` over `msg`; the zero signature never verifies.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> bool {
        signature.verify(self, msg)
    }
}

impl Seed {
    /// Draws a fresh seed from the supplied randomness source.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let mut bytes = [0u8; Self::SIZE];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|source| Error::PuzzleGenerationFailed {
                puzzle: "keys",
                source,
            })?;

        Ok(Self(bytes))
    }
}

impl PrivateKey {
    /// Expands a seed into the full private key.
    pub fn from_seed(seed: &Seed) -> Self {
        Self(SigningKey::from_bytes(&seed.0).to_keypair_bytes())
    }

    /// Generates a fresh keypair, without any proof-of-work.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        Seed::generate(rng).map(|seed| Self::from_seed(&seed))
    }

    pub fn seed(&self) -> Seed {
        let mut bytes = [0u8; Seed::SIZE];
        bytes.copy_from_slice(&self.0[..Seed::SIZE]);
        Seed(bytes)
    }

    pub fn public(&self) -> PublicKey {
        let mut bytes = [0u8; PublicKey::SIZE];
        bytes.copy_from_slice(&self.0[Seed::SIZE..]);
        PublicKey(bytes)
    }

    /// Checks that the public half was derived from the seed.
    pub fn validate(&self) -> Result<()> {
        SigningKey::from_keypair_bytes(&self.0)
            .map(|_| ())
            .map_err(|_| Error::InvalidPrivateKey)
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        let signing_key = SigningKey::from_bytes(&self.seed().0);
        Signature(signing_key.sign(msg).to_bytes())
    }
}

impl Signature {
    /// Verifies this signature over `msg` against `public_key`.
    pub fn verify(&self, public_key: &PublicKey, msg: &[u8]) -> bool {
        if self.is_zero() {
            return false;
        }

        let verifying_key = match VerifyingKey::from_bytes(&public_key.0) {
            Ok(key) => key,
            Err(_) => return false,
        };

        verifying_key
            .verify(msg, &ed25519_dalek::Signature::from_bytes(&self.0))
            .is_ok()
    }
}

impl NodeId {
    /// Returns `true` if the identifier meets the static puzzle difficulty `c1`.
    pub fn satisfies(&self, c1: usize) -> bool {
        leading_zero_bits(&self.0) >= c1
    }
}

impl X {
    /// Returns `true` if this nonce meets the dynamic puzzle difficulty `c2` for `id`.
    pub fn satisfies(&self, id: &NodeId, c2: usize) -> bool {
        leading_zero_bits(&xor_bytes(&id.0, &self.0)) >= c2
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;

    #[test]
    fn private_key_halves() {
        let mut rng = thread_rng();
        let private_key = PrivateKey::generate(&mut rng).unwrap();

        assert!(private_key.validate().is_ok());
        assert_eq!(PrivateKey::from_seed(&private_key.seed()), private_key);
        assert_eq!(&private_key.as_bytes()[..32], private_key.seed().as_bytes());
        assert_eq!(&private_key.as_bytes()[32..], private_key.public().as_bytes());
        assert!(!private_key.is_zero());
        assert!(!private_key.public().is_zero());
    }

    #[test]
    fn mismatched_private_key_is_rejected() {
        let mut rng = thread_rng();
        let mut bytes = PrivateKey::generate(&mut rng).unwrap().to_bytes();
        let other = PrivateKey::generate(&mut rng).unwrap();
        bytes[32..].copy_from_slice(other.public().as_bytes());

        assert!(matches!(
            PrivateKey::new(bytes).validate(),
            Err(Error::InvalidPrivateKey)
        ));
    }

    #[test]
    fn sign_and_verify() {
        let mut rng = thread_rng();
        let private_key = PrivateKey::generate(&mut rng).unwrap();
        let public_key = private_key.public();

        let signature = private_key.sign(b"hello");
        assert!(public_key.verify(b"hello", &signature));
        assert!(signature.verify(&public_key, b"hello"));
        assert!(!public_key.verify(b"goodbye", &signature));

        let other = PrivateKey::generate(&mut rng).unwrap().public();
        assert!(!other.verify(b"hello", &signature));
    }

    #[test]
    fn zero_signature_never_verifies() {
        let mut rng = thread_rng();
        let public_key = PrivateKey::generate(&mut rng).unwrap().public();

        let msgs: [&[u8]; 3] = [b"", b"hello", &[0u8; 64]];
        for msg in msgs {
            assert!(!Signature::ZERO.verify(&public_key, msg));
            assert!(!Signature::ZERO.verify(&PublicKey::ZERO, msg));
        }
    }

    #[test]
    fn node_id_is_deterministic() {
        let mut rng = thread_rng();
        let public_key = PrivateKey::generate(&mut rng).unwrap().public();

        assert_eq!(public_key.node_id(), public_key.node_id());
        assert_eq!(
            public_key.node_id().as_bytes(),
            blake3::hash(public_key.as_bytes()).as_bytes()
        );
    }

    #[test]
    fn puzzle_checks() {
        let id = NodeId::new([0xff; 32]);

        // Any identifier meets a zero difficulty.
        assert!(id.satisfies(0));
        assert!(!id.satisfies(1));
        assert!(NodeId::ZERO.satisfies(256));

        // The XOR of equal values is all zeros.
        assert!(X::new([0xff; 32]).satisfies(&id, 256));
        assert!(!X::ZERO.satisfies(&id, 1));
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let private_key = PrivateKey::generate(&mut thread_rng()).unwrap();
        let seed_hex = private_key.seed().to_string();

        let debug = format!("{:?}", private_key);
        assert_eq!(debug, "PrivateKey(<redacted>)");
        assert!(!debug.contains(&seed_hex));
        assert_eq!(format!("{:?}", private_key.seed()), "Seed(<redacted>)");

        // The public half still prints in full.
        assert!(format!("{:?}", private_key.public()).contains(&private_key.public().to_string()));
    }

    #[test]
    fn display_is_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        let key = PublicKey::new(bytes);

        assert!(key.to_string().starts_with("ab00"));
        assert_eq!(key.to_string().len(), 64);
        assert!(format!("{:?}", key).starts_with("PublicKey(ab"));
    }
}
