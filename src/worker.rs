//! Background task plumbing.
//!
//! Loads, saves and imports each run on their own named thread and report back over one
//! channel. Every task is stamped with a generation so the document can drop results that
//! arrive after the user has moved on.

use crate::error::Result;
use crate::loader::LoadedText;
use crate::saver::SavedFile;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// A message from a background task to the UI thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Periodic decode progress for a load.
    LoadProgress { generation: u64, bytes_read: u64, total: u64 },
    /// Final result of a load. Exactly one per load.
    Loaded { generation: u64, result: Result<LoadedText> },
    /// Final result of a save.
    Saved { generation: u64, result: Result<SavedFile> },
    /// Final result of a web import.
    Fetched { generation: u64, result: Result<String> },
}

impl WorkerEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::LoadProgress { generation, .. }
            | Self::Loaded { generation, .. }
            | Self::Saved { generation, .. }
            | Self::Fetched { generation, .. } => *generation,
        }
    }
}

/// The receiving end plus the generation counter.
pub struct Workers {
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
    next_generation: u64,
}

impl Workers {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, next_generation: 1 }
    }

    /// Allocate a fresh generation for a task about to be spawned.
    pub fn next_generation(&mut self) -> u64 {
        let g = self.next_generation;
        self.next_generation += 1;
        g
    }

    pub fn sender(&self) -> Sender<WorkerEvent> {
        self.tx.clone()
    }

    /// Everything that has arrived so far, without blocking.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        self.rx.try_iter().collect()
    }

    /// Block for at most `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Default for Workers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase_and_events_are_drained_in_order() {
        let mut w = Workers::new();
        let a = w.next_generation();
        let b = w.next_generation();
        assert!(b > a);

        let tx = w.sender();
        tx.send(WorkerEvent::Fetched { generation: a, result: Ok("one".into()) }).unwrap();
        tx.send(WorkerEvent::LoadProgress { generation: b, bytes_read: 1, total: 2 }).unwrap();
        let events = w.drain();
        assert_eq!(events.iter().map(WorkerEvent::generation).collect::<Vec<_>>(), vec![a, b]);
        assert!(w.drain().is_empty());
    }

    #[test]
    fn recv_timeout_returns_none_when_idle() {
        let w = Workers::new();
        assert!(w.recv_timeout(Duration::from_millis(10)).is_none());
    }
}
