//! XOR-distance arithmetic over byte strings.

use crate::core::{contact::Contact, id::PublicKey};

/// Returns the position of the first set bit in `buf`, or `8 * buf.len()` if every bit is unset.
///
/// This is both the proof-of-work difficulty measure and the bucket selection function: the
/// more leading zeros the XOR of two keys has, the closer the keys are.
pub fn leading_zero_bits(buf: &[u8]) -> usize {
    buf.iter()
        .position(|&byte| byte != 0)
        .map(|i| (i << 3) + buf[i].leading_zeros() as usize)
        .unwrap_or(buf.len() << 3)
}

/// XORs two byte strings, the result is as long as the shorter input.
pub fn xor_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(&a, &b)| a ^ b).collect()
}

/// The XOR distance between two keys.
pub fn distance(a: &PublicKey, b: &PublicKey) -> [u8; PublicKey::SIZE] {
    let mut out = [0u8; PublicKey::SIZE];
    for (byte, (&a, &b)) in out
        .iter_mut()
        .zip(a.as_bytes().iter().zip(b.as_bytes().iter()))
    {
        *byte = a ^ b;
    }

    out
}

/// Sorts contacts by ascending XOR distance to `reference`.
///
/// Distances are compared as big-endian byte strings, the sort is stable.
pub fn sort_by_distance(reference: &PublicKey, contacts: &mut [Contact]) {
    contacts.sort_by_key(|contact| distance(reference, contact.public_key()));
}
