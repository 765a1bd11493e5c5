//! The section recognizer: from raw edges to a [`RawCode`].
//!
//! A frame on the wire looks like this: a very long HIGH pulse (the
//! initialization sequence), then a run of short/long pulses carrying the
//! code, then a long HIGH separator, then possibly more code/separator
//! repetitions. The [`Track`] watches the edge stream for that shape.
//!
//! Low durations and high durations are classified independently, each by
//! its own [`Rail`], because some remotes use different pulse widths per
//! level. The track keeps the two rails in step, decides where a section
//! ends (separator, full record, or error), and accumulates the surviving
//! sections into a [`RawCode`] for the decoders to chew on.
//!
//! The first low/high pair of a section is *not* fed to the rails: with
//! nothing learned yet it could not be classified reliably. It is stored
//! aside and recovered later by the decoders, once the section's pulse
//! widths are known.

use heapless::Vec;

use crate::constants::{BAND_MIN_D, MAX_SECTIONS, TRACK_MIN_BITS, TRACK_MIN_INITSEQ_DURATION};
use crate::decoder::{self, Convention, DecoderChain, Filter};
use crate::edge_ring::{Edge, EdgeRing, Level};
use crate::rail::{Mood, Rail, RailStatus};

/// Receive cycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum TrackState {
    /// Waiting for an initialization pulse.
    Wait,
    /// Accumulating code sections.
    Recv,
    /// A full frame is recorded and ready for decoding.
    Data,
}

/// How a recorded section ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum SectionStatus {
    /// Both rails filled their record; the code continues in the next
    /// section.
    Continued,
    /// Separator, with the low rail's last pulse being a short one.
    ShortSep,
    /// Separator, with the low rail's last pulse being a long one.
    LongSep,
    /// Both rails saw the separator.
    SepSep,
    /// The section did not terminate cleanly.
    Error,
}

/// The characteristic pulse widths of one section.
///
/// When the two rails agree on their short and long widths, the shared
/// values are stored in `low_short`/`low_long` and the high fields are
/// zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub struct Timings {
    /// Short pulse width on the low rail (or shared).
    pub low_short: u16,
    /// Long pulse width on the low rail (or shared).
    pub low_long: u16,
    /// Short pulse width on the high rail; zero when shared.
    pub high_short: u16,
    /// Long pulse width on the high rail; zero when shared.
    pub high_long: u16,
    /// Separator duration; zero for a continued section.
    pub sep: u16,
}

/// [`Timings`] plus the frame-level and border durations a decoder
/// reports back to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub struct ExtendedTimings {
    /// Initialization pulse duration (first decoder of a frame only).
    pub initseq: u16,
    /// Short pulse width on the low rail (or shared).
    pub low_short: u16,
    /// Long pulse width on the low rail (or shared).
    pub low_long: u16,
    /// Short pulse width on the high rail; zero when shared.
    pub high_short: u16,
    /// Long pulse width on the high rail; zero when shared.
    pub high_long: u16,
    /// Separator duration; zero for a continued section.
    pub sep: u16,
    /// First low duration of the section, zero once recovered as a step.
    pub first_low: u16,
    /// First high duration of the section, zero once recovered as a step.
    pub first_high: u16,
    /// Width of the leading low pulse an inverted tri-bit decoder skipped.
    pub first_low_ignored: u16,
    /// Last low duration seen before the separator.
    pub last_low: u16,
}

/// One contiguous run of classified pulses between separators.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct Section {
    /// Low rail bit record, most recent bit in bit 0.
    pub low_rec: u16,
    /// Number of pulses the low rail classified.
    pub low_bits: u8,
    /// Number of distinct bands the low rail learned.
    pub low_bands: u8,
    /// High rail bit record.
    pub high_rec: u16,
    /// Number of pulses the high rail classified.
    pub high_bits: u8,
    /// Number of distinct bands the high rail learned.
    pub high_bands: u8,
    /// First low duration (not in the record).
    pub first_low: u16,
    /// First high duration (not in the record).
    pub first_high: u16,
    /// Last low duration.
    pub last_low: u16,
    /// Characteristic pulse widths.
    pub ts: Timings,
    /// How the section ended.
    pub sts: SectionStatus,
}

/// Everything recorded for one frame: the initialization pulse and the
/// ordered sections.
#[derive(Clone, Debug, Default)]
pub struct RawCode {
    /// Initialization pulse duration.
    pub initseq: u16,
    /// Upper bound for in-code durations: 3/4 of the initialization
    /// pulse. Anything at least this long cannot be part of the code.
    pub max_code_d: u16,
    /// Recorded sections, in arrival order.
    pub sections: Vec<Section, MAX_SECTIONS>,
}

/// The section recognizer.
///
/// Feed it edges with [`Track::eat`] (or [`Track::drain`] from a ring)
/// and ask for decoded results with [`Track::get_data`].
///
/// # Examples
///
/// ```
/// use rf433_kit::edge_ring::Level;
/// use rf433_kit::rail::Mood;
/// use rf433_kit::track::{Track, TrackState};
///
/// let mut track = Track::new(Mood::default());
/// track.eat(Level::High, 9000); // initialization pulse arms the track
/// assert_eq!(track.state(), TrackState::Recv);
/// ```
pub struct Track {
    state: TrackState,
    count: u16,
    r_low: Rail,
    r_high: Rail,
    prev_level: Level,
    first_low: u16,
    first_high: u16,
    last_low: u16,
    rawcode: RawCode,
}

impl Track {
    /// A track waiting for an initialization pulse.
    #[must_use]
    pub fn new(mood: Mood) -> Self {
        Self {
            state: TrackState::Wait,
            count: 0,
            r_low: Rail::new(mood),
            r_high: Rail::new(mood),
            prev_level: Level::High,
            first_low: 0,
            first_high: 0,
            last_low: 0,
            rawcode: RawCode::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TrackState {
        self.state
    }

    /// The frame recorded so far.
    #[must_use]
    pub const fn rawcode(&self) -> &RawCode {
        &self.rawcode
    }

    /// Drop everything and wait for the next initialization pulse.
    pub fn reset(&mut self) {
        self.state = TrackState::Wait;
        self.rawcode.sections.clear();
    }

    /// Process one edge: `d` microseconds spent at `level`.
    pub fn eat(&mut self, level: Level, d: u16) {
        // A discarded opening can restart the track, in which case the
        // same edge is fed again (it may be the next frame's init pulse).
        let mut pending = Some((level, d));
        while let Some((level, d)) = pending {
            pending = self.eat_step(level, d);
        }
    }

    /// Pump edges from `ring` until it is empty or a full frame is
    /// recorded. Returns true iff the track reached [`TrackState::Data`].
    pub fn drain(&mut self, ring: &EdgeRing) -> bool {
        while self.state != TrackState::Data {
            let Some(Edge { level, duration }) = ring.pop() else {
                break;
            };
            self.eat(level, duration);
        }
        self.state == TrackState::Data
    }

    /// Terminate any in-progress section by feeding two synthetic edges
    /// that cannot classify.
    pub fn force_stop(&mut self) {
        if self.state == TrackState::Recv {
            self.eat(Level::Low, 0);
            self.eat(Level::High, 0);
        }
    }

    /// Build the decoder chain for the recorded frame and run the filter
    /// over it. The caller owns the result.
    #[must_use]
    pub fn get_data(&self, filter: Filter, convention: Convention) -> DecoderChain {
        decoder::decode(&self.rawcode, filter, convention)
    }

    fn reset_borders(&mut self) {
        self.count = 0;
        self.first_low = 0;
        self.first_high = 0;
        self.last_low = 0;
    }

    fn eat_step(&mut self, level: Level, d: u16) -> Option<(Level, u16)> {
        match self.state {
            TrackState::Wait => {
                if level == Level::High && d >= TRACK_MIN_INITSEQ_DURATION {
                    self.r_low.reset();
                    self.r_high.reset();
                    self.prev_level = level;
                    self.rawcode.initseq = d;
                    self.rawcode.max_code_d = d - (d >> 2);
                    self.reset_borders();
                    self.state = TrackState::Recv;
                }
                None
            }
            TrackState::Recv => self.recv_step(level, d),
            TrackState::Data => None,
        }
    }

    fn recv_step(&mut self, level: Level, d: u16) -> Option<(Level, u16)> {
        // Two edges at the same level mean the edge source missed one in
        // between; the section in progress cannot be trusted.
        let mut force_close = level == self.prev_level;
        self.prev_level = level;

        self.count = self.count.saturating_add(1);
        let out_of_code = d < BAND_MIN_D || d >= self.rawcode.max_code_d;

        if self.count <= 2 {
            // The opening low/high pair is kept aside, not classified.
            if out_of_code && self.rawcode.sections.is_empty() {
                self.reset();
                return Some((level, d));
            }
            if self.count == 1 {
                self.first_low = d;
            } else {
                self.first_high = d;
            }
            return None;
        }

        let rail_open = match level {
            Level::Low => self.r_low.status == RailStatus::Open,
            Level::High => self.r_high.status == RailStatus::Open,
        };
        if !rail_open {
            return None;
        }
        if level == Level::Low {
            self.last_low = d;
        }

        let mut still_open = false;
        if out_of_code && self.count < u16::from(TRACK_MIN_BITS) {
            force_close = true;
        } else if (i16::from(self.r_low.index) - i16::from(self.r_high.index)).abs() >= 2 {
            // The rails drifted apart; an edge went missing somewhere.
            force_close = true;
        } else if !force_close {
            still_open = match level {
                Level::Low => self.r_low.eat(d),
                Level::High => self.r_high.eat(d),
            };
        }

        let level = if force_close { Level::High } else { level };
        if level == Level::High && (!still_open || self.r_low.status != RailStatus::Open) {
            return self.close_section(d);
        }
        None
    }

    fn close_section(&mut self, d: u16) -> Option<(Level, u16)> {
        if self.r_low.status == RailStatus::Open {
            self.r_low.status = RailStatus::Closed;
        }
        if self.r_high.status == RailStatus::Open {
            self.r_high.status = RailStatus::Closed;
        }

        let sts = match (self.r_low.status, self.r_high.status) {
            (RailStatus::Full, RailStatus::Full) => SectionStatus::Continued,
            (
                RailStatus::Closed | RailStatus::Full | RailStatus::Error,
                RailStatus::StopReceived,
            ) => {
                if self.r_low.last_bit {
                    SectionStatus::LongSep
                } else {
                    SectionStatus::ShortSep
                }
            }
            (RailStatus::StopReceived, RailStatus::StopReceived) => SectionStatus::SepSep,
            _ => SectionStatus::Error,
        };

        // Short sections are noise, unless they extend a section that
        // closed only because its record filled up.
        let tiny = self.r_low.index < TRACK_MIN_BITS || self.r_high.index < TRACK_MIN_BITS;
        let prev_continued = matches!(
            self.rawcode.sections.last(),
            Some(prev) if prev.sts == SectionStatus::Continued
        );
        let record = sts != SectionStatus::Error && (!tiny || prev_continued);

        if record {
            let sep = if matches!(
                sts,
                SectionStatus::ShortSep | SectionStatus::LongSep | SectionStatus::SepSep
            ) {
                d
            } else {
                0
            };
            let ts = self.merged_timings(sep);
            let section = Section {
                low_rec: self.r_low.rec,
                low_bits: self.r_low.index,
                low_bands: self.r_low.band_count(),
                high_rec: self.r_high.rec,
                high_bits: self.r_high.index,
                high_bands: self.r_high.band_count(),
                first_low: self.first_low,
                first_high: self.first_high,
                last_low: self.last_low,
                ts,
                sts,
            };
            // Cannot overflow: reaching the cap flips to Data below.
            self.rawcode.sections.push(section).ok();
            if self.rawcode.sections.is_full() {
                self.state = TrackState::Data;
            } else {
                self.r_low.reset_soft();
                self.r_high.reset_soft();
                if sts != SectionStatus::Continued {
                    self.reset_borders();
                }
            }
            None
        } else if self.rawcode.sections.is_empty() {
            // Nothing recorded yet: start over, and give this closing
            // edge a chance to be the next frame's init pulse.
            self.reset();
            Some((Level::High, d))
        } else {
            self.state = TrackState::Data;
            None
        }
    }

    /// When the two rails learned the same pulse widths, collapse the
    /// four timings into one shared short/long pair.
    fn merged_timings(&mut self, sep: u16) -> Timings {
        let high_short = self.r_high.b_short.mid;
        let high_long = self.r_high.b_long.mid;
        let shared = self.r_low.b_short.test_value(high_short)
            && !self.r_low.b_short.test_value(high_long)
            && !self.r_low.b_long.test_value(high_short)
            && self.r_low.b_long.test_value(high_long);
        if shared {
            Timings {
                low_short: (self.r_low.b_short.mid + high_short) >> 1,
                low_long: (self.r_low.b_long.mid + high_long) >> 1,
                high_short: 0,
                high_long: 0,
                sep,
            }
        } else {
            Timings {
                low_short: self.r_low.b_short.mid,
                low_long: self.r_low.b_long.mid,
                high_short,
                high_long,
                sep,
            }
        }
    }
}
