//! Recording register backend for host tests.
//!
//! [`MockIo`] is a cheap-to-clone handle onto shared state: hand one clone to
//! the driver and keep another to script reads and inspect what the driver
//! did. Reads are served from a per-offset queue first and fall back to a
//! sticky value (zero unless set). Writes never feed back into reads, which
//! matches controllers whose read and write sides share an offset.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{IoMapper, RegisterIo};

/// One recorded bus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// A register read and the value returned.
    Read {
        /// Byte offset.
        offset: usize,
        /// Value handed back to the driver.
        value: u32,
    },
    /// A register write.
    Write {
        /// Byte offset.
        offset: usize,
        /// Value written.
        value: u32,
    },
    /// A barrier.
    Barrier,
}

#[derive(Debug, Default)]
struct State {
    sticky: HashMap<usize, u32>,
    queued: HashMap<usize, VecDeque<u32>>,
    log: Vec<Access>,
    mapped: Vec<usize>,
}

/// Shared-state recording backend.
#[derive(Debug, Clone, Default)]
pub struct MockIo {
    state: Arc<Mutex<State>>,
}

impl MockIo {
    /// Creates a backend where every register reads as zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test thread poisons the lock; the data is still fine
        // for the remaining assertions.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Sets the value returned by reads of `offset` once its queue is empty.
    pub fn set(&self, offset: usize, value: u32) {
        self.state().sticky.insert(offset, value);
    }

    /// Queues values returned, in order, by the next reads of `offset`.
    pub fn queue(&self, offset: usize, values: &[u32]) {
        self.state()
            .queued
            .entry(offset)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Every access since creation (or the last [`clear_log`](Self::clear_log)).
    #[must_use]
    pub fn log(&self) -> Vec<Access> {
        self.state().log.clone()
    }

    /// Forgets recorded accesses; scripted reads are kept.
    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    /// Writes in order, as `(offset, value)` pairs.
    #[must_use]
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.state()
            .log
            .iter()
            .filter_map(|a| match *a {
                Access::Write { offset, value } => Some((offset, value)),
                _ => None,
            })
            .collect()
    }

    /// Values written to `offset`, in order.
    #[must_use]
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes()
            .into_iter()
            .filter(|&(o, _)| o == offset)
            .map(|(_, v)| v)
            .collect()
    }

    /// Number of reads of `offset`.
    #[must_use]
    pub fn reads_of(&self, offset: usize) -> usize {
        self.state()
            .log
            .iter()
            .filter(|a| matches!(a, Access::Read { offset: o, .. } if *o == offset))
            .count()
    }

    /// Number of barriers issued.
    #[must_use]
    pub fn barriers(&self) -> usize {
        self.state()
            .log
            .iter()
            .filter(|a| **a == Access::Barrier)
            .count()
    }

    /// Bases handed to [`IoMapper::map`], in order.
    #[must_use]
    pub fn mapped_bases(&self) -> Vec<usize> {
        self.state().mapped.clone()
    }
}

impl RegisterIo for MockIo {
    fn read32(&self, offset: usize) -> u32 {
        let mut state = self.state();
        let queued = state.queued.get_mut(&offset).and_then(VecDeque::pop_front);
        let value = queued.unwrap_or_else(|| state.sticky.get(&offset).copied().unwrap_or(0));
        state.log.push(Access::Read { offset, value });
        value
    }

    fn write32(&self, offset: usize, value: u32) {
        self.state().log.push(Access::Write { offset, value });
    }

    fn barrier(&self) {
        self.state().log.push(Access::Barrier);
    }
}

impl IoMapper for MockIo {
    type Io = MockIo;

    fn map(&self, base: usize) -> MockIo {
        self.state().mapped.push(base);
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_reads_precede_sticky_value() {
        let io = MockIo::new();
        io.set(0x08, 0x4);
        io.queue(0x08, &[0x0, 0x1]);
        assert_eq!(io.read32(0x08), 0x0);
        assert_eq!(io.read32(0x08), 0x1);
        assert_eq!(io.read32(0x08), 0x4);
        assert_eq!(io.read32(0x08), 0x4);
        assert_eq!(io.reads_of(0x08), 4);
        assert_eq!(io.read32(0x10), 0);
    }

    #[test]
    fn writes_do_not_feed_reads() {
        let io = MockIo::new();
        io.write32(0x10, 0x30);
        assert_eq!(io.read32(0x10), 0);
        assert_eq!(io.writes_to(0x10), [0x30]);
    }

    #[test]
    fn log_preserves_order_across_clones() {
        let io = MockIo::new();
        let driver_side = io.clone();
        driver_side.write32(0x40, 1);
        driver_side.barrier();
        driver_side.write32(0x70, b'A'.into());
        assert_eq!(
            io.log(),
            [
                Access::Write { offset: 0x40, value: 1 },
                Access::Barrier,
                Access::Write { offset: 0x70, value: 0x41 },
            ]
        );
        assert_eq!(io.barriers(), 1);
        io.clear_log();
        assert!(io.log().is_empty());
    }

    #[test]
    fn mapper_records_bases() {
        let io = MockIo::new();
        let _ = io.map(0x1000);
        let _ = io.map(0x2000);
        assert_eq!(io.mapped_bases(), [0x1000, 0x2000]);
    }
}
