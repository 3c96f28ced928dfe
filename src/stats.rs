use std::sync::atomic::{AtomicU64, Ordering};

/// Coordinator counters
#[derive(Debug, Default)]
pub(crate) struct InsertCounters {
    queued: AtomicU64,
    direct_writes: AtomicU64,
    duplicates: AtomicU64,
    deferred: AtomicU64,
}

impl InsertCounters {
    pub(crate) fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_direct_write(&self) {
        self.direct_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> InsertStats {
        InsertStats {
            queued: self.queued.load(Ordering::Relaxed),
            direct_writes: self.direct_writes.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
        }
    }
}

/// Enqueue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    /// Requests handed to the queue
    pub queued: u64,
    /// Requests written directly (queue failure or force-sync)
    pub direct_writes: u64,
    /// Direct writes rejected as duplicates
    pub duplicates: u64,
    /// Requests parked in a retry buffer
    pub deferred: u64,
}
