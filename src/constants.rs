//! Tuning constants for the decoder.
//!
//! All durations are in microseconds. These values were chosen for the
//! cheap 433 MHz OOK receiver modules (MX-RM-5V and friends) driven by
//! commodity remote controls; none of them is protocol-specific.

/// Largest representable duration. Deltas measured by the edge task
/// saturate here, and a separator band's upper edge is pinned here.
pub const MAX_DURATION: u16 = 65535;

/// Shortest pulse a value band will accept. Anything shorter is receiver
/// noise, not coding.
pub const BAND_MIN_D: u16 = 64;

/// Longest pulse a value band will accept.
///
/// Must stay below 32768: separator detection doubles a learned band
/// center and the result has to fit in a `u16`.
pub const BAND_MAX_D: u16 = 30000;

/// A HIGH pulse at least this long arms the section recognizer: every
/// frame opens with a long initialization pulse.
pub const TRACK_MIN_INITSEQ_DURATION: u16 = 4000;

/// Sections with fewer recorded pulses than this on either rail are noise,
/// unless they extend a section that filled its record.
pub const TRACK_MIN_BITS: u8 = 7;

/// Maximum number of code sections kept per frame. Reaching the cap ends
/// the receive cycle.
pub const MAX_SECTIONS: usize = 8;

/// Width of a rail's bit record. A rail that classifies this many pulses
/// declares itself full and the section continues in a new record.
pub const BITS_PER_RECORD: u8 = 16;

/// Capacity of the ring buffer between the edge task and the consumer.
/// Must be a power of two (index arithmetic is done with a mask).
pub const EDGE_RING_SIZE: usize = 4;

/// Shortest edge the silence waiter counts as plausible signal activity.
pub const SILENCE_MIN_D: u16 = 200;

/// Longest edge the silence waiter counts as plausible signal activity.
pub const SILENCE_MAX_D: u16 = 25000;

/// Number of edges the silence waiter looks back over.
pub const SILENCE_WINDOW: u8 = 16;

/// Minimum number of in-range edges within the window for the channel to
/// be considered free (12 of 16, i.e. 75%).
pub const SILENCE_THRESHOLD: u8 = 12;

/// Worst-case number of decoded bits for one frame: the raw fallback
/// decoder emits two bits per signal step, and a section contributes at
/// most one step per recorded pulse plus the one recovered leading step.
pub const MAX_CODE_BITS: usize = 2 * (BITS_PER_RECORD as usize + 1) * MAX_SECTIONS;

const _: () = assert!(EDGE_RING_SIZE.is_power_of_two());
const _: () = assert!(BAND_MAX_D < 32768);
