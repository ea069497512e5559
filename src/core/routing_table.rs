//! The XOR-metric routing table.

use tracing::trace;

use crate::core::{
    bits::{distance, leading_zero_bits, sort_by_distance},
    contact::Contact,
    id::PublicKey,
};

/// The number of buckets, one per bit of the key space.
pub const BUCKETS: usize = PublicKey::SIZE * 8;

/// The default maximum number of contacts in a bucket.
pub const DEFAULT_BUCKET_CAPACITY: usize = 16;

/// The outcome of [`RoutingTable::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The contact was new and has been inserted at the front of its bucket.
    Inserted,
    /// The contact was known, its record was replaced and moved to the front of its bucket.
    Refreshed,
    /// The contact was new but its bucket is full, nothing was changed.
    BucketFull,
    /// The contact carries the local key.
    RejectedSelf,
}

/// The core routing table data structure.
///
/// Contacts are stored in [`BUCKETS`] buckets, the bucket a key lands in is the number of
/// leading zero bits in its XOR distance to the local key. Each bucket is ordered with the most
/// recently seen contact at the front and never holds more than the configured capacity.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    // The node's local key, never present in the buckets.
    local_key: PublicKey,
    // The maximum number of contacts that can be contained in a bucket.
    capacity: usize,
    // The total number of contacts, always the sum of the bucket lengths.
    len: usize,
    buckets: Box<[Vec<Contact>; BUCKETS]>,
}

impl RoutingTable {
    /// Creates a new routing table.
    pub fn new(local_key: PublicKey, capacity: usize) -> Self {
        Self {
            local_key,
            capacity,
            len: 0,
            buckets: Box::new(std::array::from_fn(|_| Vec::new())),
        }
    }

    /// Returns the local key this table measures distance from.
    pub fn local_key(&self) -> PublicKey {
        self.local_key
    }

    /// Returns the maximum number of contacts per bucket.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the total number of contacts in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the bucket index for a key.
    ///
    /// The count of leading zeros is capped to the last bucket, which is where the local key
    /// itself maps to.
    pub fn bucket_index(&self, key: &PublicKey) -> usize {
        leading_zero_bits(&distance(key, &self.local_key)).min(BUCKETS - 1)
    }

    /// Returns the contacts in a bucket, most recently seen first.
    pub fn bucket(&self, index: usize) -> Option<&[Contact]> {
        self.buckets.get(index).map(Vec::as_slice)
    }

    /// Iterates over every contact in the table, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.buckets.iter().flatten()
    }

    /// Inserts a new contact or refreshes a known one.
    ///
    /// A full bucket is left as is, no contact is ever evicted to make room. Callers wanting to
    /// replace stale contacts can probe [`RoutingTable::least_recently_seen`] and
    /// [`RoutingTable::remove`] it themselves.
    pub fn update(&mut self, contact: Contact) -> UpdateResult {
        let key = *contact.public_key();
        if key == self.local_key {
            return UpdateResult::RejectedSelf;
        }

        let i = self.bucket_index(&key);
        let bucket = &mut self.buckets[i];

        if let Some(pos) = bucket.iter().position(|c| c.public_key() == &key) {
            // Move to the front, replacing the record in case the address changed.
            bucket.remove(pos);
            bucket.insert(0, contact);
            trace!(bucket = i, %key, "refreshed contact");

            return UpdateResult::Refreshed;
        }

        if bucket.len() < self.capacity {
            bucket.insert(0, contact);
            self.len += 1;
            trace!(bucket = i, %key, "inserted contact");

            return UpdateResult::Inserted;
        }

        trace!(bucket = i, %key, "bucket is full");
        UpdateResult::BucketFull
    }

    /// Removes the contact with the given key, returning whether it was present.
    pub fn remove(&mut self, key: &PublicKey) -> bool {
        let i = self.bucket_index(key);
        let bucket = &mut self.buckets[i];

        match bucket.iter().position(|c| c.public_key() == key) {
            Some(pos) => {
                bucket.remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if a contact with the given key is present.
    pub fn has(&self, key: &PublicKey) -> bool {
        self.get(key).is_some()
    }

    /// Returns the contact with the given key, if present.
    pub fn get(&self, key: &PublicKey) -> Option<&Contact> {
        self.buckets[self.bucket_index(key)]
            .iter()
            .find(|c| c.public_key() == key)
    }

    /// Returns the least recently seen contact in the bucket `key` maps to.
    pub fn least_recently_seen(&self, key: &PublicKey) -> Option<&Contact> {
        self.buckets[self.bucket_index(key)].last()
    }

    /// Returns up to `k` contacts closest to `target`, closest first. A contact carrying the
    /// target key is never returned.
    pub fn closest_to(&self, target: &PublicKey, k: usize) -> Vec<Contact> {
        let k = k.min(self.len);
        if k == 0 {
            return Vec::new();
        }

        let mut closest = Vec::with_capacity(k + self.capacity);
        let fill = |closest: &mut Vec<Contact>, i: usize| {
            closest.extend(
                self.buckets[i]
                    .iter()
                    .filter(|c| c.public_key() != target)
                    .copied(),
            );
        };

        // The target's own bucket holds the tightest matches, its neighbours by bit length may
        // still hold contacts closer than some of those, so widen the search in both directions
        // until enough candidates have been collected and let the sort settle the order.
        let m = self.bucket_index(target);
        fill(&mut closest, m);

        let mut d = 1;
        while closest.len() < k && (d <= m || m + d < BUCKETS) {
            if d <= m {
                fill(&mut closest, m - d);
            }
            if m + d < BUCKETS {
                fill(&mut closest, m + d);
            }
            d += 1;
        }

        sort_by_distance(target, &mut closest);
        closest.truncate(k);

        closest
    }
}
