//! Host-level tests for the edge ring buffer.

use rf433_kit::constants::EDGE_RING_SIZE;
use rf433_kit::edge_ring::{Edge, EdgeRing, Level};

fn edge(duration: u16) -> Edge {
    Edge {
        level: if duration % 2 == 0 {
            Level::Low
        } else {
            Level::High
        },
        duration,
    }
}

#[test]
fn pops_in_push_order() {
    let ring = EdgeRing::new();
    ring.push(edge(1));
    ring.push(edge(2));
    ring.push(edge(3));
    assert_eq!(ring.pop(), Some(edge(1)));
    assert_eq!(ring.pop(), Some(edge(2)));
    assert_eq!(ring.pop(), Some(edge(3)));
    assert_eq!(ring.pop(), None);
}

#[test]
fn empty_ring_pops_none() {
    let ring = EdgeRing::new();
    assert_eq!(ring.pop(), None);
}

#[test]
fn overflow_drops_the_oldest_edge() {
    let ring = EdgeRing::new();
    for d in 1..=EDGE_RING_SIZE as u16 {
        ring.push(edge(d));
    }
    // One slot is sacrificed to tell full from empty; the oldest edge
    // was overwritten, the fresher ones survive.
    assert_eq!(ring.pop(), Some(edge(2)));
    assert_eq!(ring.pop(), Some(edge(3)));
    assert_eq!(ring.pop(), Some(edge(4)));
    assert_eq!(ring.pop(), None);
}

#[test]
fn keeps_the_freshest_under_sustained_overflow() {
    let ring = EdgeRing::new();
    for d in 1..=100 {
        ring.push(edge(d));
    }
    assert_eq!(ring.pop(), Some(edge(98)));
    assert_eq!(ring.pop(), Some(edge(99)));
    assert_eq!(ring.pop(), Some(edge(100)));
    assert_eq!(ring.pop(), None);
}

#[test]
fn high_water_mark_tracks_worst_backlog() {
    let ring = EdgeRing::new();
    assert_eq!(ring.max_pending(), 0);
    ring.push(edge(1));
    assert_eq!(ring.max_pending(), 1);
    ring.pop();
    ring.push(edge(2));
    // Draining does not lower the mark.
    assert_eq!(ring.max_pending(), 1);
    ring.push(edge(3));
    ring.push(edge(4));
    ring.push(edge(5));
    assert_eq!(ring.max_pending(), (EDGE_RING_SIZE - 1) as u8);
}

#[test]
fn interleaved_producer_consumer_loses_nothing() {
    let ring = EdgeRing::new();
    let mut seen = Vec::new();
    for d in 1..=50 {
        ring.push(edge(d));
        if let Some(e) = ring.pop() {
            seen.push(e.duration);
        }
    }
    assert_eq!(seen, (1..=50).collect::<Vec<_>>());
}
