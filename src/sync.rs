use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    core::{
        contact::Contact,
        id::{NodeId, PrivateKey, PublicKey, X},
        puzzle,
        routing_table::{RoutingTable, UpdateResult},
    },
    error::{Error, Result},
};

#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
#[derive(Debug, Clone)]
/// A routing table implementation suitable for use in async contexts.
///
/// It wraps [`RoutingTable`] in a reader/writer lock: lookups share the lock, updates and
/// removals take it exclusively. Clones share the same underlying table.
pub struct SyncRoutingTable {
    routing_table: Arc<RwLock<RoutingTable>>,
}

impl SyncRoutingTable {
    pub fn new(local_key: PublicKey, capacity: usize) -> Self {
        Self {
            routing_table: Arc::new(RwLock::new(RoutingTable::new(local_key, capacity))),
        }
    }

    pub fn local_key(&self) -> PublicKey {
        self.routing_table.read().local_key()
    }

    pub fn len(&self) -> usize {
        self.routing_table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routing_table.read().is_empty()
    }

    pub fn update(&self, contact: Contact) -> UpdateResult {
        self.routing_table.write().update(contact)
    }

    pub fn remove(&self, key: &PublicKey) -> bool {
        self.routing_table.write().remove(key)
    }

    pub fn has(&self, key: &PublicKey) -> bool {
        self.routing_table.read().has(key)
    }

    pub fn least_recently_seen(&self, key: &PublicKey) -> Option<Contact> {
        self.routing_table.read().least_recently_seen(key).copied()
    }

    pub fn closest_to(&self, target: &PublicKey, k: usize) -> Vec<Contact> {
        self.routing_table.read().closest_to(target, k)
    }

    /// Replaces the least recently seen contact in `contact`'s bucket if the bucket is full and
    /// `is_stale` holds for it, all under a single write lock.
    pub fn update_or_replace<F>(&self, contact: Contact, is_stale: F) -> UpdateResult
    where
        F: FnOnce(&Contact) -> bool,
    {
        let mut rt_g = self.routing_table.write();
        match rt_g.update(contact) {
            UpdateResult::BucketFull => {
                let tail = match rt_g.least_recently_seen(contact.public_key()) {
                    Some(tail) => *tail,
                    None => return UpdateResult::BucketFull,
                };
                if !is_stale(&tail) {
                    return UpdateResult::BucketFull;
                }

                rt_g.remove(tail.public_key());
                rt_g.update(contact)
            }
            result => result,
        }
    }
}

/// Solves the static puzzle on the blocking thread pool.
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub async fn solve_static(c1: usize) -> Result<(PublicKey, PrivateKey)> {
    tokio::task::spawn_blocking(move || puzzle::solve_static(&mut rand::thread_rng(), c1))
        .await
        .map_err(|_| Error::PuzzleAborted)?
}

/// Solves the dynamic puzzle on the blocking thread pool.
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub async fn solve_dynamic(id: NodeId, c2: usize) -> Result<X> {
    tokio::task::spawn_blocking(move || puzzle::solve_dynamic(&mut rand::thread_rng(), &id, c2))
        .await
        .map_err(|_| Error::PuzzleAborted)?
}
