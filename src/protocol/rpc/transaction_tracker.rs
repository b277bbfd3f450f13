//! Duplicate request cache for RPC as described in RFC 5531 (previously RFC 1057).
//!
//! NFS version 2 has several procedures that are not idempotent: a retried
//! REMOVE, RENAME, LINK, CREATE, MKDIR or RMDIR would fail with a spurious
//! error if it were executed a second time. Calls are therefore tracked by
//! transaction ID (XID) and client address:
//!
//! - a duplicate of a call that is still being processed is dropped
//! - a duplicate of a completed call is answered with the cached reply
//! - completed entries are forgotten once the retention window has passed

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

/// Outcome of registering an incoming call with the [`TransactionTracker`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transaction {
    /// First time this call is seen; it must be processed
    New,
    /// The original call is still being processed; drop the duplicate
    InProgress,
    /// The call already completed; send this reply again
    Completed(Vec<u8>),
}

/// Tracks RPC transactions to detect and answer retransmissions
pub struct TransactionTracker {
    retention_period: Duration,
    transactions: Mutex<HashMap<(u32, String), TransactionState>>,
}

impl TransactionTracker {
    /// Creates a tracker that remembers completed calls for `retention_period`
    pub fn new(retention_period: Duration) -> Self {
        Self { retention_period, transactions: Mutex::new(HashMap::new()) }
    }

    /// Registers a call, marking it in progress if it has not been seen before.
    pub fn begin(&self, xid: u32, client_addr: &str) -> Transaction {
        let mut transactions = self.transactions.lock().unwrap_or_else(PoisonError::into_inner);
        housekeeping(&mut transactions, self.retention_period);
        match transactions.entry((xid, client_addr.to_string())) {
            Entry::Vacant(e) => {
                e.insert(TransactionState::InProgress);
                Transaction::New
            }
            Entry::Occupied(e) => match e.get() {
                TransactionState::InProgress => Transaction::InProgress,
                TransactionState::Completed { reply, .. } => Transaction::Completed(reply.clone()),
            },
        }
    }

    /// Records the reply of a processed call so retransmissions can be answered with it
    pub fn complete(&self, xid: u32, client_addr: &str, reply: &[u8]) {
        let mut transactions = self.transactions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = transactions.get_mut(&(xid, client_addr.to_string())) {
            trace!("caching {} reply bytes for xid {}", reply.len(), xid);
            *tx = TransactionState::Completed { at: Instant::now(), reply: reply.to_vec() };
        }
    }

    /// Forgets a call that failed without a reply, so that a retransmission is processed again
    pub fn abandon(&self, xid: u32, client_addr: &str) {
        let mut transactions = self.transactions.lock().unwrap_or_else(PoisonError::into_inner);
        transactions.remove(&(xid, client_addr.to_string()));
    }
}

/// Removes completed transactions older than `max_age`.
///
/// In-progress transactions are kept regardless of age.
fn housekeeping(transactions: &mut HashMap<(u32, String), TransactionState>, max_age: Duration) {
    transactions.retain(|_, v| match v {
        TransactionState::InProgress => true,
        TransactionState::Completed { at, .. } => at.elapsed() <= max_age,
    });
}

enum TransactionState {
    InProgress,
    Completed { at: Instant, reply: Vec<u8> },
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: &str = "127.0.0.1:700";

    #[test]
    fn duplicate_of_running_call_is_dropped() {
        let tracker = TransactionTracker::new(Duration::from_secs(60));
        assert_eq!(tracker.begin(7, CLIENT), Transaction::New);
        assert_eq!(tracker.begin(7, CLIENT), Transaction::InProgress);
        // same xid from another client is a different call
        assert_eq!(tracker.begin(7, "127.0.0.1:701"), Transaction::New);
    }

    #[test]
    fn duplicate_of_completed_call_gets_cached_reply() {
        let tracker = TransactionTracker::new(Duration::from_secs(60));
        assert_eq!(tracker.begin(9, CLIENT), Transaction::New);
        tracker.complete(9, CLIENT, &[1, 2, 3]);
        assert_eq!(tracker.begin(9, CLIENT), Transaction::Completed(vec![1, 2, 3]));
    }

    #[test]
    fn expired_and_abandoned_calls_are_processed_again() {
        let tracker = TransactionTracker::new(Duration::ZERO);
        assert_eq!(tracker.begin(1, CLIENT), Transaction::New);
        tracker.complete(1, CLIENT, &[0]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(tracker.begin(1, CLIENT), Transaction::New);

        tracker.abandon(1, CLIENT);
        assert_eq!(tracker.begin(1, CLIENT), Transaction::New);
    }
}
