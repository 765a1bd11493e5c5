//! From classified pulses back to data bits.
//!
//! A recorded section only says "short" or "long" for every pulse; which
//! line coding produced them is unknown. Each candidate coding gets a
//! decoder: the codings are tried in a fixed order and the first one that
//! decodes the section without errors wins. Two raw decoders back the
//! real ones up: a sync counter for preamble sections where both rails
//! collapsed to a single pulse width, and a fallback that records the
//! short/long pattern verbatim so the operator can at least inspect it.
//!
//! A frame is a chain of decoders, one per run of sections (sections that
//! ended with a full record continue into the next one and share a
//! decoder). The chain is an owning vector in frame order.

use core::cmp::Ordering;
use core::ops::BitOr;

use heapless::Vec;

use crate::band::Band;
use crate::bit_vector::BitVector;
use crate::constants::MAX_SECTIONS;
use crate::track::{ExtendedTimings, RawCode, Section, SectionStatus, Timings};

/// One pulse classified against a rail's bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum Signal {
    /// Matched the short band.
    Short,
    /// Matched the long band.
    Long,
    /// Matched neither, or position exhausted.
    Other,
}

/// Bit polarity for the symmetric codings: which of the two pulse shapes
/// means a zero bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub enum Convention {
    /// short-then-long is 0 (tri-bit), low-to-high is 0 (Manchester).
    #[default]
    Conv0,
    /// The opposite polarity.
    Conv1,
}

impl Convention {
    const fn bit(self) -> bool {
        matches!(self, Self::Conv1)
    }
}

/// The coding a decoder implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum DecoderKind {
    /// The section's rails disagree; nothing can be decoded.
    RawInconsistent,
    /// Synchronization preamble: a repeated single pulse shape.
    RawSync,
    /// Each bit is a (short, long) or (long, short) low/high pair.
    TriBit,
    /// Tri-bit with the bit spanning a high/low pair instead.
    TriBitInv,
    /// Each bit is a mid-period transition.
    Manchester,
    /// Fallback: the raw short/long pattern, two bits per step.
    RawUnknown,
}

impl DecoderKind {
    /// One-letter tag used when printing results.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::RawInconsistent => 'I',
            Self::RawSync => 'S',
            Self::TriBit => 'T',
            Self::TriBitInv => 'N',
            Self::Manchester => 'M',
            Self::RawUnknown => 'U',
        }
    }
}

/// Result filter, a combinable bit mask.
///
/// ```
/// use rf433_kit::decoder::Filter;
///
/// let filter = Filter::NO_ERROR | Filter::DEDUP;
/// assert!(filter.contains(Filter::DEDUP));
/// assert!(!filter.contains(Filter::DECODED));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub struct Filter(u8);

impl Filter {
    /// Keep everything.
    pub const ALL: Self = Self(0);
    /// Keep only decoders that actually decoded data bits.
    pub const DECODED: Self = Self(1);
    /// Keep only decoders with a zero error count.
    pub const NO_ERROR: Self = Self(2);
    /// Collapse consecutive identical results into one, counting repeats.
    pub const DEDUP: Self = Self(4);
    /// Keep tri-bit results (when any coding bit is set, the others drop).
    pub const TRI: Self = Self(8);
    /// Keep inverted tri-bit results.
    pub const TRN: Self = Self(16);
    /// Keep Manchester results.
    pub const MAN: Self = Self(32);

    /// True if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    const fn any_coding_bit(self) -> bool {
        self.0 & (Self::TRI.0 | Self::TRN.0 | Self::MAN.0) != 0
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Per-coding decoder state.
#[derive(Clone, Copy, Debug)]
enum Coding {
    RawInconsistent,
    RawSync {
        nb_low_high: u8,
        shape: Option<Signal>,
    },
    TriBit,
    TriBitInv {
        started: bool,
        initial_low: Signal,
        last_high: Signal,
    },
    Manchester {
        // Half-bit symbol FIFO: false = low half, true = high half.
        buf: [bool; 3],
        len: u8,
        leading_passed: bool,
    },
    RawUnknown {
        final_low: Signal,
        ends_with_sep: bool,
    },
}

/// One decoded (or raw) result for a run of sections.
#[derive(Clone, Debug)]
pub struct Decoder {
    coding: Coding,
    convention: Convention,
    nb_errors: u8,
    pdata: BitVector,
    tsext: ExtendedTimings,
    repeats: u8,
}

/// A frame's decoders in order. Owned by the caller.
pub type DecoderChain = Vec<Decoder, MAX_SECTIONS>;

impl Decoder {
    fn new(kind: DecoderKind, convention: Convention) -> Self {
        let coding = match kind {
            DecoderKind::RawInconsistent => Coding::RawInconsistent,
            DecoderKind::RawSync => Coding::RawSync {
                nb_low_high: 0,
                shape: None,
            },
            DecoderKind::TriBit => Coding::TriBit,
            DecoderKind::TriBitInv => Coding::TriBitInv {
                started: false,
                initial_low: Signal::Other,
                last_high: Signal::Other,
            },
            DecoderKind::Manchester => Coding::Manchester {
                buf: [false; 3],
                len: 0,
                leading_passed: false,
            },
            DecoderKind::RawUnknown => Coding::RawUnknown {
                final_low: Signal::Other,
                ends_with_sep: false,
            },
        };
        Self {
            coding,
            convention,
            nb_errors: 0,
            pdata: BitVector::new(),
            tsext: ExtendedTimings::default(),
            repeats: 0,
        }
    }

    fn new_raw_sync(nb_low_high: u8) -> Self {
        let mut dec = Self::new(DecoderKind::RawSync, Convention::Conv0);
        dec.coding = Coding::RawSync {
            nb_low_high,
            shape: None,
        };
        dec
    }

    /// The coding this decoder implements.
    #[must_use]
    pub const fn kind(&self) -> DecoderKind {
        match self.coding {
            Coding::RawInconsistent => DecoderKind::RawInconsistent,
            Coding::RawSync { .. } => DecoderKind::RawSync,
            Coding::TriBit => DecoderKind::TriBit,
            Coding::TriBitInv { .. } => DecoderKind::TriBitInv,
            Coding::Manchester { .. } => DecoderKind::Manchester,
            Coding::RawUnknown { .. } => DecoderKind::RawUnknown,
        }
    }

    /// Number of coding-rule violations hit while decoding.
    #[must_use]
    pub const fn nb_errors(&self) -> u8 {
        self.nb_errors
    }

    /// Decoded bit count; for a sync decoder, the number of counted
    /// low/high pairs.
    #[must_use]
    pub const fn nb_bits(&self) -> u16 {
        match self.coding {
            Coding::RawSync { nb_low_high, .. } => nb_low_high as u16,
            _ => self.pdata.nb_bits(),
        }
    }

    /// The decoded bits.
    #[must_use]
    pub const fn data(&self) -> &BitVector {
        &self.pdata
    }

    /// Timing metadata for the sections behind this result.
    #[must_use]
    pub fn timings(&self) -> ExtendedTimings {
        let mut tsext = self.tsext;
        tsext.first_low_ignored = self.first_low_ignored();
        tsext
    }

    /// How many later identical results were folded into this one by the
    /// dedup filter.
    #[must_use]
    pub const fn repeats(&self) -> u8 {
        self.repeats
    }

    /// True for the codings that actually decode data, with data present.
    #[must_use]
    pub fn data_got_decoded(&self) -> bool {
        matches!(
            self.kind(),
            DecoderKind::TriBit | DecoderKind::TriBitInv | DecoderKind::Manchester
        ) && !self.pdata.is_empty()
    }

    /// For the raw fallback only: the shape of the dangling low that
    /// preceded the section's separator, if the section ended in one.
    #[must_use]
    pub const fn raw_tail(&self) -> Option<Signal> {
        match self.coding {
            Coding::RawUnknown {
                final_low,
                ends_with_sep: true,
            } => Some(final_low),
            _ => None,
        }
    }

    fn first_low_ignored(&self) -> u16 {
        match self.coding {
            Coding::TriBitInv {
                initial_low: Signal::Short,
                ..
            } => self.tsext.low_short,
            Coding::TriBitInv {
                initial_low: Signal::Long,
                ..
            } => self.tsext.low_long,
            _ => 0,
        }
    }

    fn add_data_bit(&mut self, bit: bool) {
        self.pdata.add_bit(bit);
    }

    fn add_sync(&mut self, n: u8) {
        if let Coding::RawSync { nb_low_high, .. } = &mut self.coding {
            *nb_low_high = nb_low_high.saturating_add(n);
        }
    }

    fn set_ts(&mut self, initseq: u16, ts: &Timings) {
        self.tsext.initseq = initseq;
        self.tsext.low_short = ts.low_short;
        self.tsext.low_long = ts.low_long;
        self.tsext.high_short = ts.high_short;
        self.tsext.high_long = ts.high_long;
        self.tsext.sep = ts.sep;
    }

    fn add_signal_step(&mut self, lo: Signal, hi: Signal) {
        match self.coding {
            Coding::RawInconsistent => {}
            Coding::RawSync { .. } => self.sync_step(lo, hi),
            Coding::TriBit => self.tribit_step(lo, hi),
            Coding::TriBitInv { .. } => self.tribit_inv_step(lo, hi),
            Coding::Manchester { .. } => self.manchester_step(lo, hi),
            Coding::RawUnknown { .. } => self.raw_step(lo, hi),
        }
    }

    fn sync_step(&mut self, lo: Signal, hi: Signal) {
        let Coding::RawSync {
            mut nb_low_high,
            mut shape,
        } = self.coding
        else {
            return;
        };
        let sync_shape = *shape.get_or_insert(lo);
        if lo != sync_shape {
            self.nb_errors += 1;
        } else if hi == Signal::Other {
            // Dangling final low before the separator: neither an error
            // nor a counted pair.
        } else if lo != hi {
            self.nb_errors += 1;
        } else {
            nb_low_high = nb_low_high.saturating_add(1);
        }
        self.coding = Coding::RawSync { nb_low_high, shape };
    }

    fn tribit_step(&mut self, lo: Signal, hi: Signal) {
        if hi == Signal::Other {
            return;
        }
        let bit = match (lo, hi) {
            (Signal::Short, Signal::Long) => self.convention.bit(),
            (Signal::Long, Signal::Short) => !self.convention.bit(),
            _ => {
                self.nb_errors += 1;
                return;
            }
        };
        self.add_data_bit(bit);
    }

    fn tribit_inv_step(&mut self, lo: Signal, hi: Signal) {
        let Coding::TriBitInv {
            started,
            initial_low,
            last_high,
        } = self.coding
        else {
            return;
        };
        if !started {
            self.coding = Coding::TriBitInv {
                started: true,
                initial_low: lo,
                last_high: hi,
            };
            return;
        }
        self.coding = Coding::TriBitInv {
            started,
            initial_low,
            last_high: hi,
        };
        let bit = match (lo, last_high) {
            (Signal::Short, Signal::Long) => !self.convention.bit(),
            (Signal::Long, Signal::Short) => self.convention.bit(),
            _ => {
                self.nb_errors += 1;
                return;
            }
        };
        self.add_data_bit(bit);
    }

    fn manchester_step(&mut self, lo: Signal, hi: Signal) {
        let Coding::Manchester {
            mut buf,
            mut len,
            mut leading_passed,
        } = self.coding
        else {
            return;
        };
        if lo == Signal::Other {
            self.nb_errors += 1;
            return;
        }

        fn push(buf: &mut [bool; 3], len: &mut u8, symbol: bool) {
            debug_assert!(*len < 3);
            if *len < 3 {
                buf[*len as usize] = symbol;
                *len += 1;
            }
        }

        for (symbol, signal) in [(false, lo), (true, hi)] {
            if signal == Signal::Other {
                // Position exhausted on one rail; no half-bit to push.
                continue;
            }
            push(&mut buf, &mut len, symbol);
            if signal == Signal::Long {
                push(&mut buf, &mut len, symbol);
            }
            if len >= 2 {
                if leading_passed {
                    match (buf[0], buf[1]) {
                        (false, true) => self.add_data_bit(self.convention.bit()),
                        (true, false) => self.add_data_bit(!self.convention.bit()),
                        _ => self.nb_errors += 1,
                    }
                } else {
                    // The mandatory leading half-bit pair must be
                    // low-then-high.
                    if buf[0] || !buf[1] {
                        self.nb_errors += 1;
                    }
                    leading_passed = true;
                }
                buf[0] = buf[2];
                len -= 2;
            }
        }

        self.coding = Coding::Manchester {
            buf,
            len,
            leading_passed,
        };
    }

    fn raw_step(&mut self, lo: Signal, hi: Signal) {
        if hi == Signal::Other {
            self.coding = Coding::RawUnknown {
                final_low: lo,
                ends_with_sep: true,
            };
            return;
        }
        self.add_data_bit(lo == Signal::Long);
        self.add_data_bit(hi == Signal::Long);
    }

    /// Recover the section's unclassified opening low/high pair. Each
    /// duration is tested against fresh bands built from the section's
    /// learned pulse widths; if both classify, they make one extra
    /// leading step.
    fn take_first_low_high(&mut self, sec: &Section, continues_previous: bool) {
        if continues_previous {
            return;
        }
        self.tsext.first_low = sec.first_low;
        self.tsext.first_high = sec.first_high;
        self.tsext.last_low = sec.last_low;

        // A section whose rails share one timing pair stores it in the
        // low fields only.
        let (high_short, high_long) = if sec.ts.high_short == 0 && sec.ts.high_long == 0 {
            (sec.ts.low_short, sec.ts.low_long)
        } else {
            (sec.ts.high_short, sec.ts.high_long)
        };
        let lo = classify(sec.first_low, sec.ts.low_short, sec.ts.low_long);
        let hi = classify(sec.first_high, high_short, high_long);

        if lo != Signal::Other && hi != Signal::Other {
            self.add_signal_step(lo, hi);
            self.tsext.first_low = 0;
            self.tsext.first_high = 0;
        }
    }

    /// Walk the section's two bit records most-significant first, in
    /// lock-step, feeding one signal step per position.
    fn decode_section(&mut self, sec: &Section, continues_previous: bool) {
        self.take_first_low_high(sec, continues_previous);

        let mut pos_low = sec.low_bits;
        let mut pos_high = sec.high_bits;
        while pos_low >= 1 || pos_high >= 1 {
            let mut lo = Signal::Other;
            let mut hi = Signal::Other;
            if pos_low >= 1 {
                pos_low -= 1;
                lo = if sec.low_rec & (1u16 << pos_low) != 0 {
                    Signal::Long
                } else {
                    Signal::Short
                };
            }
            if pos_high >= 1 {
                pos_high -= 1;
                hi = if sec.high_rec & (1u16 << pos_high) != 0 {
                    Signal::Long
                } else {
                    Signal::Short
                };
            }
            self.add_signal_step(lo, hi);
        }
    }
}

fn classify(d: u16, short_d: u16, long_d: u16) -> Signal {
    let mut b_short = Band::new();
    let mut b_long = Band::new();
    b_short.init(short_d);
    b_long.init(long_d);
    match (b_short.test_value(d), b_long.test_value(d)) {
        (true, false) => Signal::Short,
        (false, true) => Signal::Long,
        (true, true) if short_d == long_d => Signal::Short,
        _ => Signal::Other,
    }
}

/// Build the decoder chain for a recorded frame and apply `filter`.
/// [`crate::track::Track::get_data`] is the usual way in.
#[must_use]
pub fn decode(rawcode: &RawCode, filter: Filter, convention: Convention) -> DecoderChain {
    let mut chain = build_chain(rawcode, convention);
    apply_filter(&mut chain, filter);
    chain
}

/// The codings tried, in order, on a fresh two-band section. The raw
/// fallback never errors, so the search always terminates.
const CANDIDATES: [DecoderKind; 4] = [
    DecoderKind::TriBit,
    DecoderKind::TriBitInv,
    DecoderKind::Manchester,
    DecoderKind::RawUnknown,
];

fn build_chain(rawcode: &RawCode, convention: Convention) -> DecoderChain {
    let mut chain = DecoderChain::new();
    let mut open: Option<Decoder> = None;
    let last = rawcode.sections.len().saturating_sub(1);

    for (i, sec) in rawcode.sections.iter().enumerate() {
        let spread = i16::from(sec.low_bits) - i16::from(sec.high_bits);
        if spread.abs() >= 2 {
            if open.is_none() {
                open = Some(Decoder::new(DecoderKind::RawInconsistent, convention));
            }
        } else if sec.low_bands == 1 && sec.high_bands == 1 {
            let pairs = sec.low_bits.min(sec.high_bits);
            if let Some(dec) = open.as_mut() {
                dec.add_sync(pairs);
            } else {
                let mut dec = Decoder::new_raw_sync(pairs);
                dec.take_first_low_high(sec, false);
                open = Some(dec);
            }
        } else if sec.low_bands == 1 || sec.high_bands == 1 {
            if open.is_none() {
                open = Some(Decoder::new(DecoderKind::RawInconsistent, convention));
            }
        } else if let Some(dec) = open.as_mut() {
            // A continuation is decoded by the decoder already chosen
            // for the run; its errors accumulate.
            dec.decode_section(sec, true);
        } else {
            for kind in CANDIDATES {
                let mut dec = Decoder::new(kind, convention);
                dec.decode_section(sec, false);
                if dec.nb_errors() == 0 {
                    open = Some(dec);
                    break;
                }
            }
        }

        if let Some(dec) = open.as_mut() {
            let initseq = if chain.is_empty() {
                rawcode.initseq
            } else {
                0
            };
            dec.set_ts(initseq, &sec.ts);
        }
        if sec.sts != SectionStatus::Continued || i == last {
            if let Some(dec) = open.take() {
                chain.push(dec).ok();
            }
        }
    }
    chain
}

fn apply_filter(chain: &mut DecoderChain, filter: Filter) {
    let mut kept = DecoderChain::new();
    for mut dec in core::mem::take(chain) {
        dec.repeats = 0;
        let mut keep = true;
        if filter.contains(Filter::DECODED) && !dec.data_got_decoded() {
            keep = false;
        }
        if filter.contains(Filter::NO_ERROR) && dec.nb_errors != 0 {
            keep = false;
        }
        if filter.contains(Filter::DEDUP) {
            if let Some(prev) = kept.last_mut() {
                if prev.kind() == dec.kind() && prev.pdata.cmp(&dec.pdata) == Ordering::Equal {
                    prev.repeats = prev.repeats.saturating_add(1);
                    keep = false;
                }
            }
        }
        if filter.any_coding_bit() {
            let coding_ok = match dec.kind() {
                DecoderKind::TriBit => filter.contains(Filter::TRI),
                DecoderKind::TriBitInv => filter.contains(Filter::TRN),
                DecoderKind::Manchester => filter.contains(Filter::MAN),
                _ => true,
            };
            if !coding_ok {
                keep = false;
            }
        }
        if keep {
            kept.push(dec).ok();
        }
    }
    *chain = kept;
}
