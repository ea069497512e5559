//! Contact records: a peer's key and where to reach it.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::BufMut;

use crate::{
    core::{
        id::PublicKey,
        traits::{split_array, Wire},
    },
    error::{Error, Invalid, Result},
};

const FLAG_IPV4: u8 = 0;
const FLAG_IPV6: u8 = 1;

const IPV4_LEN: usize = 4;
const IPV6_LEN: usize = 16;

/// A peer's public key along with its address.
///
/// Contacts are immutable. The routing table identifies peers by key alone, so two contacts
/// with the same key and different addresses describe the same peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contact {
    public_key: PublicKey,
    addr: SocketAddr,
}

impl Contact {
    /// The encoded size of a contact with an IPv4 host.
    pub const MIN_SIZE: usize = PublicKey::SIZE + 1 + IPV4_LEN + 2;
    /// The encoded size of a contact with an IPv6 host.
    pub const MAX_SIZE: usize = PublicKey::SIZE + 1 + IPV6_LEN + 2;

    /// Creates a new contact, the port must be nonzero.
    pub fn new(public_key: PublicKey, addr: SocketAddr) -> Result<Self> {
        if addr.port() == 0 {
            return Err(Invalid::ZeroPort.into());
        }

        Ok(Self { public_key, addr })
    }

    /// Creates a contact from a raw host, which must be 4 or 16 bytes long.
    pub fn from_parts(public_key: PublicKey, host: &[u8], port: u16) -> Result<Self> {
        let ip = match host.len() {
            IPV4_LEN => {
                let (octets, _) = split_array::<IPV4_LEN>(host)?;
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            IPV6_LEN => {
                let (octets, _) = split_array::<IPV6_LEN>(host)?;
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            len => return Err(Invalid::HostLength(len).into()),
        };

        Self::new(public_key, SocketAddr::new(ip, port))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The encoded size of this contact.
    pub fn encoded_len(&self) -> usize {
        match self.addr.ip() {
            IpAddr::V4(_) => Self::MIN_SIZE,
            IpAddr::V6(_) => Self::MAX_SIZE,
        }
    }
}

impl Wire for Contact {
    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(self.public_key.as_bytes());
        match self.addr.ip() {
            IpAddr::V4(ip) => {
                dst.put_u8(FLAG_IPV4);
                dst.put_slice(&ip.octets());
            }
            IpAddr::V6(ip) => {
                dst.put_u8(FLAG_IPV6);
                dst.put_slice(&ip.octets());
            }
        }
        dst.put_u16(self.addr.port());
    }

    fn decode(src: &[u8]) -> Result<(Self, &[u8])> {
        if src.len() < Self::MIN_SIZE {
            return Err(Error::truncated(Self::MIN_SIZE, src.len()));
        }

        let (public_key, src) = split_array::<{ PublicKey::SIZE }>(src)?;
        let (flag, src) = split_array::<1>(src)?;

        // The address length is only known once the flag has been read.
        let (ip, src) = match flag[0] {
            FLAG_IPV4 => {
                let (octets, src) = split_array::<IPV4_LEN>(src)?;
                (IpAddr::V4(Ipv4Addr::from(octets)), src)
            }
            FLAG_IPV6 => {
                let (octets, src) = split_array::<IPV6_LEN>(src)?;
                (IpAddr::V6(Ipv6Addr::from(octets)), src)
            }
            flag => return Err(Invalid::AddressFamily(flag).into()),
        };

        let (port, src) = split_array::<2>(src)?;
        let contact = Self::new(
            PublicKey::new(public_key),
            SocketAddr::new(ip, u16::from_be_bytes(port)),
        )?;

        Ok((contact, src))
    }
}
