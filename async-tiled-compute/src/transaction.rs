use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Identifier of one generation: a value of the monotonic zoom counter.
pub type TransactionId = u16;

/// Shared handle around the process-wide newest-transaction counter.
///
/// Every pan or zoom bumps the counter and stamps the resulting id on the
/// generation it starts; workers poll the counter and abandon themselves
/// as soon as their stamp is no longer the newest. Sixteen bits are
/// enough: by the time the counter wraps, any task stamped with the
/// duplicate id has long since drained.
///
/// Reads are relaxed — a stale read costs at most one extra scanline of
/// wasted work before the next poll.
#[derive(Clone, Debug, Default)]
pub struct NewestTransaction {
    counter: Arc<AtomicU16>,
}

impl NewestTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation: increment (wrapping) and return the new id.
    pub fn bump(&self) -> TransactionId {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn current(&self) -> TransactionId {
        self.counter.load(Ordering::Relaxed)
    }

    /// True while `transaction` is still the newest generation.
    pub fn is_current(&self, transaction: TransactionId) -> bool {
        self.current() == transaction
    }
}
