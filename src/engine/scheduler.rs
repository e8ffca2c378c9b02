//! Cooperative timer queue for replay.
//!
//! Tasks are plain data, not closures: the session pumps the queue and
//! performs the play/stop itself, so the single-owner state never has to
//! be shared with a callback. Tasks with equal due times run in
//! submission order. Nothing is cancelled implicitly; a batch stays
//! scheduled until it fires or the caller cancels it by id.

use crate::recorder::EventKind;

/// Identifies the tasks scheduled by one replay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplayBatch(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayTask {
    pub due: f64,
    pub batch: ReplayBatch,
    pub note: u8,
    pub kind: EventKind,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    tasks: Vec<ReplayTask>,
    next_batch: u64,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id for a group of tasks scheduled together.
    pub fn open_batch(&mut self) -> ReplayBatch {
        let batch = ReplayBatch(self.next_batch);
        self.next_batch += 1;
        batch
    }

    pub fn schedule(&mut self, due: f64, batch: ReplayBatch, note: u8, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(ReplayTask { due, batch, note, kind, seq });
    }

    /// Remove and return every task due at or before `now`, ordered by
    /// (due time, submission order).
    pub fn drain_due(&mut self, now: f64) -> Vec<ReplayTask> {
        let mut due: Vec<ReplayTask> = self.tasks.iter().copied().filter(|t| t.due <= now).collect();
        self.tasks.retain(|t| t.due > now);
        due.sort_by(|a, b| {
            a.due
                .partial_cmp(&b.due)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        due
    }

    /// Drop every pending task belonging to `batch`.
    pub fn cancel_batch(&mut self, batch: ReplayBatch) {
        self.tasks.retain(|t| t.batch != batch);
    }

    pub fn pending(&self) -> &[ReplayTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_only_due_tasks_in_order() {
        let mut queue = TimerQueue::new();
        let batch = queue.open_batch();
        queue.schedule(0.45, batch, 64, EventKind::Stop);
        queue.schedule(0.10, batch, 64, EventKind::Start);
        queue.schedule(0.90, batch, 60, EventKind::Start);

        let due = queue.drain_due(0.5);
        assert_eq!(due.len(), 2);
        assert_eq!((due[0].note, due[0].kind), (64, EventKind::Start));
        assert_eq!((due[1].note, due[1].kind), (64, EventKind::Stop));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn equal_due_times_keep_submission_order() {
        let mut queue = TimerQueue::new();
        let batch = queue.open_batch();
        queue.schedule(0.2, batch, 60, EventKind::Start);
        queue.schedule(0.2, batch, 64, EventKind::Start);
        queue.schedule(0.2, batch, 67, EventKind::Start);

        let notes: Vec<u8> = queue.drain_due(0.2).iter().map(|t| t.note).collect();
        assert_eq!(notes, [60, 64, 67]);
    }

    #[test]
    fn cancel_batch_leaves_other_batches() {
        let mut queue = TimerQueue::new();
        let first = queue.open_batch();
        let second = queue.open_batch();
        queue.schedule(1.0, first, 60, EventKind::Start);
        queue.schedule(1.0, second, 62, EventKind::Start);

        queue.cancel_batch(first);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending()[0].note, 62);
    }

    #[test]
    fn batches_get_distinct_ids() {
        let mut queue = TimerQueue::new();
        assert_ne!(queue.open_batch(), queue.open_batch());
    }
}
