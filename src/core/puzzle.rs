//! S/Kademlia crypto puzzles.
//!
//! The static puzzle makes identities expensive to mint: keypairs are generated until the
//! [`NodeId`] of the public key has at least `c1` leading zero bits, which takes `O(2^c1)`
//! attempts. The dynamic puzzle ties extra work to a given identifier: random nonces `X` are
//! drawn until `NodeId ^ X` has at least `c2` leading zero bits, taking `O(2^c2)` attempts.
//!
//! Both searches are unbounded, callers that care about wall-clock time should run them with
//! [`search_parallel`] and a cancellation flag.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use rand::{thread_rng, CryptoRng, RngCore};
use tracing::debug;

use crate::{
    core::id::{NodeId, PrivateKey, PublicKey, X},
    error::{Error, Result},
};

/// The default static puzzle difficulty.
pub const DEFAULT_C1: usize = 10;
/// The default dynamic puzzle difficulty.
pub const DEFAULT_C2: usize = 10;

/// Makes a single static puzzle attempt, returning the keypair if its identifier meets `c1`.
pub fn try_static<R: RngCore + CryptoRng>(
    rng: &mut R,
    c1: usize,
) -> Result<Option<(PublicKey, PrivateKey)>> {
    let private_key = PrivateKey::generate(rng)?;
    let public_key = private_key.public();

    Ok(public_key
        .node_id()
        .satisfies(c1)
        .then_some((public_key, private_key)))
}

/// Makes a single dynamic puzzle attempt, returning the nonce if it meets `c2` for `id`.
pub fn try_dynamic<R: RngCore + CryptoRng>(
    rng: &mut R,
    id: &NodeId,
    c2: usize,
) -> Result<Option<X>> {
    let mut bytes = [0u8; X::SIZE];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|source| Error::PuzzleGenerationFailed {
            puzzle: "x",
            source,
        })?;

    let x = X::new(bytes);
    Ok(x.satisfies(id, c2).then_some(x))
}

/// Generates a keypair whose identifier meets the static puzzle difficulty `c1`.
pub fn solve_static<R: RngCore + CryptoRng>(
    rng: &mut R,
    c1: usize,
) -> Result<(PublicKey, PrivateKey)> {
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        if let Some(keys) = try_static(rng, c1)? {
            debug!(c1, attempts, "solved static puzzle");
            return Ok(keys);
        }
    }
}

/// Generates a nonce meeting the dynamic puzzle difficulty `c2` for `id`.
pub fn solve_dynamic<R: RngCore + CryptoRng>(rng: &mut R, id: &NodeId, c2: usize) -> Result<X> {
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        if let Some(x) = try_dynamic(rng, id, c2)? {
            debug!(c2, attempts, "solved dynamic puzzle");
            return Ok(x);
        }
    }
}

/// Runs `attempt` on `workers` threads until one of them finds a solution.
///
/// Every worker draws from its own thread-local CSPRNG. The first solution wins and the other
/// workers stop at their next attempt; raising `cancel` stops every worker, in which case
/// `Ok(None)` is returned. A failing randomness source stops the search with its error.
pub fn search_parallel<T, F>(workers: usize, cancel: &AtomicBool, attempt: F) -> Result<Option<T>>
where
    T: Send,
    F: Fn(&mut rand::rngs::ThreadRng) -> Result<Option<T>> + Sync,
{
    let done = AtomicBool::new(false);
    let (done, attempt) = (&done, &attempt);
    let stopped = move || done.load(Ordering::Relaxed) || cancel.load(Ordering::Relaxed);

    let results: Vec<Result<Option<T>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers.max(1))
            .map(|_| {
                s.spawn(move || {
                    let mut rng = thread_rng();
                    while !stopped() {
                        match attempt(&mut rng) {
                            Ok(None) => continue,
                            found => {
                                done.store(true, Ordering::Relaxed);
                                return found;
                            }
                        }
                    }

                    Ok(None)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(Err(Error::PuzzleAborted)))
            .collect()
    });

    // A solution wins over a worker that failed at the same time.
    let mut error = None;
    for result in results {
        match result {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) => {
                error.get_or_insert(e);
            }
        }
    }

    match error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

/// Solves the static puzzle on `workers` threads, see [`search_parallel`].
pub fn solve_static_parallel(
    c1: usize,
    workers: usize,
    cancel: &AtomicBool,
) -> Result<Option<(PublicKey, PrivateKey)>> {
    search_parallel(workers, cancel, |rng| try_static(rng, c1))
}

/// Solves the dynamic puzzle on `workers` threads, see [`search_parallel`].
pub fn solve_dynamic_parallel(
    id: &NodeId,
    c2: usize,
    workers: usize,
    cancel: &AtomicBool,
) -> Result<Option<X>> {
    search_parallel(workers, cancel, |rng| try_dynamic(rng, id, c2))
}
