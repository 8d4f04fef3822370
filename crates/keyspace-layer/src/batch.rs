//! Splitting an index range into bounded batches.
//!
//! A large range scan is broken into batches so that each fetch stays bounded.
//! [`batched`] produces the batches for a single consumer; [`batched_workers`]
//! hands them out to several consumers through one shared [`BatchCursor`].
//!
//! ```
//! use keyspace_layer::batch::batched;
//!
//! let batches: Vec<_> = batched(0, 100, 20).into_iter().collect();
//! assert_eq!(batches, vec![0..20, 20..40, 40..60, 60..80, 80..100]);
//! ```

use std::iter::FusedIterator;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::constants::DEFAULT_BATCH_SIZE;

/// Clamp `count` so that `offset + count` stays representable.
fn clamp_count(offset: i64, count: i64) -> i64 {
    count.min(i64::MAX.saturating_sub(offset))
}

// =============================================================================
// Single consumer
// =============================================================================

/// A restartable plan for covering `[offset, offset + count)` in batches.
///
/// Each call to `into_iter` starts again from `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batched {
    offset: i64,
    count: i64,
    batch_size: i64,
}

/// Plan batches of at most `batch_size` indices over `[offset, offset + count)`.
///
/// A non-positive `count` or `batch_size` yields no batches.
pub fn batched(offset: i64, count: i64, batch_size: i64) -> Batched {
    let count = if batch_size > 0 { clamp_count(offset, count.max(0)) } else { 0 };
    Batched {
        offset,
        count,
        batch_size: batch_size.max(1),
    }
}

impl Batched {
    /// Number of batches the plan yields.
    pub fn batch_count(&self) -> usize {
        IntoIterator::into_iter(*self).len()
    }
}

impl From<Range<i64>> for Batched {
    /// Plan `range` in batches of [`DEFAULT_BATCH_SIZE`]. An inverted range is empty.
    fn from(range: Range<i64>) -> Self {
        batched(range.start, range.end.saturating_sub(range.start), DEFAULT_BATCH_SIZE)
    }
}

impl IntoIterator for Batched {
    type Item = Range<i64>;
    type IntoIter = Batches;

    fn into_iter(self) -> Batches {
        Batches {
            next: self.offset,
            remaining: self.count,
            batch_size: self.batch_size,
        }
    }
}

/// Iterator over the batches of a [`Batched`] plan.
#[derive(Debug, Clone)]
pub struct Batches {
    next: i64,
    remaining: i64,
    batch_size: i64,
}

impl Iterator for Batches {
    type Item = Range<i64>;

    fn next(&mut self) -> Option<Range<i64>> {
        if self.remaining <= 0 {
            return None;
        }
        let size = self.remaining.min(self.batch_size);
        let start = self.next;
        self.next += size;
        self.remaining -= size;
        Some(start..self.next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.remaining <= 0 {
            0
        } else {
            // remaining > 0 and batch_size >= 1
            let full = self.remaining / self.batch_size;
            let partial = i64::from(self.remaining % self.batch_size != 0);
            usize::try_from(full + partial).unwrap_or(usize::MAX)
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches {}

impl FusedIterator for Batches {}

// =============================================================================
// Multiple workers
// =============================================================================

#[derive(Debug)]
struct CursorState {
    next: i64,
    remaining: i64,
}

/// Shared claim point for distributing batches across workers.
///
/// Each [`claim`](BatchCursor::claim) atomically takes the next unclaimed
/// batch. Claimed batches are never returned, so every index is handed out
/// exactly once no matter how claims interleave.
#[derive(Debug)]
pub struct BatchCursor {
    state: Mutex<CursorState>,
    batch_size: i64,
}

impl BatchCursor {
    /// Create a cursor over `[offset, offset + count)`.
    ///
    /// A non-positive `count` or `batch_size` creates an exhausted cursor.
    pub fn new(offset: i64, count: i64, batch_size: i64) -> Self {
        let remaining = if batch_size > 0 { clamp_count(offset, count.max(0)) } else { 0 };
        Self {
            state: Mutex::new(CursorState { next: offset, remaining }),
            batch_size: batch_size.max(1),
        }
    }

    /// Claim the next batch, or `None` once the range is exhausted.
    pub fn claim(&self) -> Option<Range<i64>> {
        let claimed = {
            let mut state = self.state.lock();
            if state.remaining == 0 {
                None
            } else {
                let size = state.remaining.min(self.batch_size);
                let start = state.next;
                state.next += size;
                state.remaining -= size;
                Some(start..state.next)
            }
        };
        if let Some(range) = &claimed {
            trace!(start = range.start, end = range.end, "claimed batch");
        }
        claimed
    }

    /// Number of indices not yet claimed.
    pub fn remaining(&self) -> i64 {
        self.state.lock().remaining
    }

    /// Whether every index has been claimed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

/// One worker's lazy view of a shared [`BatchCursor`].
///
/// Iterating claims batches until the cursor is exhausted. The type is `Send`
/// so each worker can run on its own thread.
#[derive(Debug, Clone)]
pub struct WorkerBatches {
    cursor: Arc<BatchCursor>,
    worker: usize,
    done: bool,
}

impl WorkerBatches {
    /// Create a worker sequence drawing from `cursor`.
    pub fn new(cursor: Arc<BatchCursor>, worker: usize) -> Self {
        Self {
            cursor,
            worker,
            done: false,
        }
    }

    /// Index of this worker among its siblings.
    pub fn worker(&self) -> usize {
        self.worker
    }
}

impl Iterator for WorkerBatches {
    type Item = Range<i64>;

    fn next(&mut self) -> Option<Range<i64>> {
        if self.done {
            return None;
        }
        let claimed = self.cursor.claim();
        if claimed.is_none() {
            self.done = true;
            trace!(worker = self.worker, "worker found range exhausted");
        }
        claimed
    }
}

impl FusedIterator for WorkerBatches {}

/// Distribute `[offset, offset + count)` across `workers` lazy sequences.
///
/// All sequences share one [`BatchCursor`]; each repeatedly claims the next
/// batch of at most `batch_size` indices until the range runs out. Together
/// they cover the range exactly once. A sequence first polled after the range
/// is exhausted yields nothing.
///
/// ```
/// use keyspace_layer::batch::batched_workers;
///
/// let workers = batched_workers(0, 97, 4, 10);
/// let total: i64 = workers.into_iter().flatten().map(|r| r.end - r.start).sum();
/// assert_eq!(total, 97);
/// ```
pub fn batched_workers(offset: i64, count: i64, workers: usize, batch_size: i64) -> Vec<WorkerBatches> {
    let cursor = Arc::new(BatchCursor::new(offset, count, batch_size));
    (0..workers).map(|worker| WorkerBatches::new(Arc::clone(&cursor), worker)).collect()
}
