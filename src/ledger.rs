//! Storage ledger - the circular buffer over committed segments
//!
//! Tracks the ordered set of committed segments and their running total
//! size, and evicts from the head once the budget is exceeded. Ledger
//! mutation is single-threaded (the session engine owns it), so the queue
//! and the total never disagree.

use std::collections::VecDeque;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::dispatch::{EventDispatcher, SessionEvent};
use crate::error::{RecorderError, RecorderResult};

/// A segment whose final size is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSegment {
    pub seq: u32,
    pub location: PathBuf,
    pub size_bytes: u64,
}

pub struct StorageLedger {
    /// Oldest first; insertion order is commit order is eviction order
    queue: VecDeque<CommittedSegment>,
    total_bytes: u64,
    max_bytes: Option<u64>,
}

impl StorageLedger {
    pub fn new(max_bytes: Option<u64>) -> Self {
        Self {
            queue: VecDeque::new(),
            total_bytes: 0,
            max_bytes,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Committed locations currently held, oldest first
    pub fn locations(&self) -> Vec<PathBuf> {
        self.queue.iter().map(|s| s.location.clone()).collect()
    }

    /// Append a committed segment and enforce the budget
    ///
    /// Emits `SegmentCommitted`, then one `StorageEvicted` per deleted
    /// segment, oldest first. A deletion failure stops eviction with the
    /// failed entry still at the head and is surfaced to the caller; the
    /// commit itself has already taken effect.
    pub fn commit(
        &mut self,
        segment: CommittedSegment,
        dispatcher: &EventDispatcher,
    ) -> RecorderResult<()> {
        info!(
            seq = segment.seq,
            size = segment.size_bytes,
            total = self.total_bytes + segment.size_bytes,
            "Segment committed"
        );

        let location = segment.location.clone();
        self.total_bytes += segment.size_bytes;
        self.queue.push_back(segment);
        dispatcher.emit(SessionEvent::SegmentCommitted { location });

        self.evict(dispatcher)
    }

    /// Delete oldest segments until the total fits the budget
    ///
    /// Deliberately no minimum-retention guard: a sole committed segment
    /// larger than the budget is deleted too, draining the queue.
    fn evict(&mut self, dispatcher: &EventDispatcher) -> RecorderResult<()> {
        let Some(max_bytes) = self.max_bytes else {
            return Ok(());
        };

        while self.total_bytes > max_bytes {
            let Some(oldest) = self.queue.front() else {
                break;
            };

            if let Err(e) = std::fs::remove_file(&oldest.location) {
                // Leave the entry at the head; losing track of a file that
                // still occupies space would be worse than re-reporting it.
                warn!(
                    seq = oldest.seq,
                    location = ?oldest.location,
                    error = %e,
                    "Eviction failed, keeping segment in ledger"
                );
                return Err(RecorderError::storage(format!(
                    "failed to evict {:?}: {}",
                    oldest.location, e
                )));
            }

            let evicted = self
                .queue
                .pop_front()
                .ok_or_else(|| RecorderError::storage("eviction raced an empty queue"))?;
            self.total_bytes -= evicted.size_bytes;

            info!(
                seq = evicted.seq,
                size = evicted.size_bytes,
                remaining = self.total_bytes,
                "Evicted oldest segment"
            );
            dispatcher.emit(SessionEvent::StorageEvicted {
                location: evicted.location,
            });
        }

        Ok(())
    }
}
