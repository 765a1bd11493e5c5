//! Host-side stand-in for the radio edge source.
//!
//! A capture from a real receiver is just a list of durations; the
//! levels are implicit because they alternate. These helpers turn such a
//! list back into edges, starting with HIGH — the first duration of any
//! capture worth decoding is the frame's initialization pulse.

use crate::edge_ring::{Edge, Level};
use crate::track::Track;

/// Turn a duration list into an edge stream with alternating levels,
/// starting HIGH.
pub fn edges(durations: &[u16]) -> impl Iterator<Item = Edge> + '_ {
    let mut level = Level::High;
    durations.iter().map(move |&duration| {
        let edge = Edge { level, duration };
        level = !level;
        edge
    })
}

/// Feed a duration list straight into a track.
pub fn feed(track: &mut Track, durations: &[u16]) {
    for edge in edges(durations) {
        track.eat(edge.level, edge.duration);
    }
}
