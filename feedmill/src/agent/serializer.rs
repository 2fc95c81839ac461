//! Per-source serialization of task execution.
//!
//! Entity mutation methods are not designed to be safe under concurrent
//! mutation of the same source's state, so the dispatcher admits at most one
//! task per source id at a time. Tasks arriving for a busy source wait in
//! that source's FIFO queue and are promoted one at a time as the slot is
//! released; tasks for different sources never block each other.
//!
//! Slot entries are created on demand and removed as soon as a source has
//! neither a holder nor waiters, so resource usage stays bounded no matter
//! how many source ids pass through.
//!
//! The serializer is owned by the dispatcher's event loop and is therefore
//! single-threaded; no internal locking is needed.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use crate::source::SourceId;

use super::task::Task;

/// Result of admitting a task for its source.
pub(crate) enum Admission {
    /// The source slot was free; the task may be dispatched now.
    Immediate(Task),

    /// The source slot is held; the task was parked in FIFO order.
    Parked {
        /// Number of tasks now waiting for this source, the parked one
        /// included.
        queue_depth: usize,
    },
}

/// A source with an in-flight task; presence in the map means the slot is
/// held.
struct SourceSlot {
    waiting: VecDeque<Task>,
}

/// FIFO admission control keyed by source id.
pub(crate) struct SourceSerializer {
    slots: HashMap<SourceId, SourceSlot>,
}

impl SourceSerializer {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Admits a task: hand it back for dispatch if its source is idle,
    /// otherwise park it behind the current holder.
    pub fn admit(&mut self, task: Task) -> Admission {
        match self.slots.entry(task.source_id()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.waiting.push_back(task);
                Admission::Parked {
                    queue_depth: slot.waiting.len(),
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(SourceSlot {
                    waiting: VecDeque::new(),
                });
                Admission::Immediate(task)
            }
        }
    }

    /// Releases a source's slot, promoting the next waiting task if any.
    ///
    /// Returns the promoted task, which now holds the slot and must be
    /// dispatched. Releasing an id with no held slot is a no-op (this only
    /// happens while shutdown is draining).
    pub fn release(&mut self, source_id: SourceId) -> Option<Task> {
        let slot = self.slots.get_mut(&source_id)?;
        match slot.waiting.pop_front() {
            Some(next) => Some(next),
            None => {
                self.slots.remove(&source_id);
                None
            }
        }
    }

    /// Number of tasks waiting behind the holder of this source's slot.
    pub fn waiting_count(&self, source_id: SourceId) -> usize {
        self.slots
            .get(&source_id)
            .map(|slot| slot.waiting.len())
            .unwrap_or(0)
    }

    /// Number of sources currently holding a slot.
    pub fn busy_sources(&self) -> usize {
        self.slots.len()
    }

    /// Removes and returns every parked task; held slots are forgotten.
    /// Used by shutdown.
    pub fn drain(&mut self) -> Vec<Task> {
        self.slots
            .drain()
            .flat_map(|(_, slot)| slot.waiting)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::task::TaskKind;

    fn test_task(source: u64) -> Task {
        Task::new(
            SourceId::new(source),
            TaskKind::SourceMarkRead,
            Box::new(|_| {}),
        )
    }

    #[test]
    fn test_first_task_is_immediate() {
        let mut serializer = SourceSerializer::new();
        let task = test_task(1);
        let id = task.id().clone();

        match serializer.admit(task) {
            Admission::Immediate(task) => assert_eq!(*task.id(), id),
            Admission::Parked { .. } => panic!("idle source must admit immediately"),
        }
        assert_eq!(serializer.busy_sources(), 1);
    }

    #[test]
    fn test_same_source_parks_fifo() {
        let mut serializer = SourceSerializer::new();

        let first = test_task(1);
        let second = test_task(1);
        let third = test_task(1);
        let second_id = second.id().clone();
        let third_id = third.id().clone();

        assert!(matches!(serializer.admit(first), Admission::Immediate(_)));
        assert!(matches!(
            serializer.admit(second),
            Admission::Parked { queue_depth: 1 }
        ));
        assert!(matches!(
            serializer.admit(third),
            Admission::Parked { queue_depth: 2 }
        ));

        // Promotion order matches submission order.
        let promoted = serializer.release(SourceId::new(1)).unwrap();
        assert_eq!(*promoted.id(), second_id);
        let promoted = serializer.release(SourceId::new(1)).unwrap();
        assert_eq!(*promoted.id(), third_id);

        // Queue empty: the slot entry disappears.
        assert!(serializer.release(SourceId::new(1)).is_none());
        assert_eq!(serializer.busy_sources(), 0);
    }

    #[test]
    fn test_different_sources_do_not_interfere() {
        let mut serializer = SourceSerializer::new();

        assert!(matches!(
            serializer.admit(test_task(1)),
            Admission::Immediate(_)
        ));
        assert!(matches!(
            serializer.admit(test_task(2)),
            Admission::Immediate(_)
        ));
        assert!(matches!(
            serializer.admit(test_task(3)),
            Admission::Immediate(_)
        ));
        assert_eq!(serializer.busy_sources(), 3);
        assert_eq!(serializer.waiting_count(SourceId::new(1)), 0);
    }

    #[test]
    fn test_release_unknown_source_is_noop() {
        let mut serializer = SourceSerializer::new();
        assert!(serializer.release(SourceId::new(42)).is_none());
    }

    #[test]
    fn test_drain_returns_parked_tasks() {
        let mut serializer = SourceSerializer::new();

        assert!(matches!(
            serializer.admit(test_task(1)),
            Admission::Immediate(_)
        ));
        serializer.admit(test_task(1));
        serializer.admit(test_task(1));
        serializer.admit(test_task(2));

        let drained = serializer.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(serializer.busy_sources(), 0);
    }
}
