//! The hand-off between the edge task and the decoder.
//!
//! The edge task timestamps GPIO transitions and must never wait; the
//! consumer drains at its own pace. A tiny ring buffer sits between the
//! two. When the consumer falls behind, the *oldest* unread edge is
//! dropped: the freshest edges describe the code still in flight and are
//! the ones worth keeping.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicU8, Ordering};

use crate::constants::EDGE_RING_SIZE;

const MASK: u8 = (EDGE_RING_SIZE - 1) as u8;

/// Signal level on the receiver's data line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum Level {
    /// No carrier.
    Low,
    /// Carrier present.
    High,
}

impl core::ops::Not for Level {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

/// One observed transition: the line spent `duration` microseconds at
/// `level`, then flipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub struct Edge {
    /// The level that just ended.
    pub level: Level,
    /// How long the line held it, saturated at `MAX_DURATION`.
    pub duration: u16,
}

struct RingState {
    slots: [Edge; EDGE_RING_SIZE],
    write: u8,
    read: u8,
}

/// Single-producer single-consumer ring of [`Edge`]s.
///
/// Both ends take a short critical section around the index update, the
/// Cortex-M equivalent of masking interrupts around the original shared
/// read. A full ring overwrites the oldest entry rather than refusing
/// the newest.
pub struct EdgeRing {
    state: Mutex<CriticalSectionRawMutex, RefCell<RingState>>,
    max_pending: AtomicU8,
}

impl EdgeRing {
    /// An empty ring. `const` so it can live in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        const EMPTY: Edge = Edge {
            level: Level::Low,
            duration: 0,
        };
        Self {
            state: Mutex::new(RefCell::new(RingState {
                slots: [EMPTY; EDGE_RING_SIZE],
                write: 0,
                read: 0,
            })),
            max_pending: AtomicU8::new(0),
        }
    }

    /// Store one edge, dropping the oldest unread one if the ring is
    /// full. Producer side; bounded O(1).
    pub fn push(&self, edge: Edge) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let write = state.write;
            state.slots[write as usize] = edge;
            let next = (write + 1) & MASK;
            if next == state.read {
                state.read = (state.read + 1) & MASK;
            }
            state.write = next;
            let pending = state.write.wrapping_sub(state.read) & MASK;
            self.max_pending.fetch_max(pending, Ordering::Relaxed);
        });
    }

    /// Take the oldest edge, if any. Consumer side; never blocks.
    pub fn pop(&self) -> Option<Edge> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.read == state.write {
                return None;
            }
            let edge = state.slots[state.read as usize];
            state.read = (state.read + 1) & MASK;
            Some(edge)
        })
    }

    /// Highest number of edges that were ever waiting at once. A value
    /// near the ring capacity means the consumer is too slow.
    #[must_use]
    pub fn max_pending(&self) -> u8 {
        self.max_pending.load(Ordering::Relaxed)
    }
}

impl Default for EdgeRing {
    fn default() -> Self {
        Self::new()
    }
}
