use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

/// A record with a binary wire representation.
///
/// Encoding appends to the destination and never touches bytes already in it. Decoding reads
/// one record off the front of the source and returns it along with the unread remainder; it
/// never panics on short or malformed input.
pub trait Wire: Sized {
    /// Appends the encoded record to `dst`.
    fn encode<B: BufMut>(&self, dst: &mut B);

    /// Decodes a record from the front of `src`.
    fn decode(src: &[u8]) -> Result<(Self, &[u8])>;

    /// Encodes the record into a fresh buffer.
    fn to_bytes(&self) -> BytesMut {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst
    }
}

/// Copies `N` bytes off the front of `src`, returning them along with the rest of the input.
pub(crate) fn split_array<const N: usize>(src: &[u8]) -> Result<([u8; N], &[u8])> {
    if src.len() < N {
        return Err(Error::truncated(N, src.len()));
    }

    let (head, tail) = src.split_at(N);
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(head);

    Ok((bytes, tail))
}
