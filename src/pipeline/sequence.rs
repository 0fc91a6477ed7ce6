use crate::keys::Address;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Lease {
    /// Next number to hand out
    next: u64,
    /// When the most recent number was leased
    leased_at: Instant,
}

/// Per-sender sequence number leases.
///
/// Builders reserve the next number optimistically so that back-to-back
/// builds for one sender never reuse a value the chain has not consumed yet.
/// An absent entry means "trust the chain". Any outcome other than an
/// on-chain confirmation drops the entry, and an entry untouched for longer
/// than the expiry is ignored, since every transaction it covered has
/// expired by then.
#[derive(Debug)]
pub struct SequenceLeases {
    leases: DashMap<Address, Lease>,
    expiry: Option<Duration>,
}

impl Default for SequenceLeases {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceLeases {
    /// Leases that never expire on their own.
    pub fn new() -> Self {
        Self {
            leases: DashMap::new(),
            expiry: None,
        }
    }

    /// Leases that fall back to the chain once `expiry` has passed since the
    /// last reservation; normally the transaction expiration window.
    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            leases: DashMap::new(),
            expiry: Some(expiry),
        }
    }

    /// Lease a sequence number given the value currently reported on-chain.
    pub fn reserve(&self, sender: &Address, on_chain: u64) -> u64 {
        let now = Instant::now();
        let mut lease = self.leases.entry(*sender).or_insert(Lease {
            next: on_chain,
            leased_at: now,
        });

        let stale = self
            .expiry
            .is_some_and(|expiry| now.duration_since(lease.leased_at) > expiry);
        if stale {
            debug!(sender = %sender, stale_next = lease.next, on_chain, "Lease expired, resyncing");
            lease.next = on_chain;
        }

        let leased = lease.next.max(on_chain);
        lease.next = leased + 1;
        lease.leased_at = now;
        debug!(sender = %sender, sequence_number = leased, "Leased sequence number");
        leased
    }

    /// Give back a lease whose transaction was never sent.
    ///
    /// Only the most recent lease can be rolled back; releasing an older one
    /// leaves a gap, so the sender is resynchronised from the chain instead.
    pub fn release(&self, sender: &Address, sequence_number: u64) {
        let resync = match self.leases.get_mut(sender) {
            Some(mut lease) if lease.next == sequence_number + 1 => {
                lease.next = sequence_number;
                false
            }
            Some(_) => true,
            None => false,
        };
        if resync {
            self.leases.remove(sender);
        }
        debug!(sender = %sender, sequence_number, resync, "Released sequence number");
    }

    /// Drop the sender's entry so the next build reads the chain again.
    ///
    /// Used whenever a transaction's fate is unknown or it did not execute.
    pub fn forget(&self, sender: &Address) {
        if self.leases.remove(sender).is_some() {
            debug!(sender = %sender, "Forgot sequence leases");
        }
    }

    /// Reconcile after `sequence_number` was consumed on-chain.
    ///
    /// Once the chain has caught up with every lease the entry is dropped.
    pub fn confirm(&self, sender: &Address, sequence_number: u64) {
        self.leases
            .remove_if(sender, |_, lease| lease.next <= sequence_number + 1);
    }

    /// Next number that would be leased, if any lease is outstanding.
    pub fn peek(&self, sender: &Address) -> Option<u64> {
        self.leases.get(sender).map(|lease| lease.next)
    }
}
