//! Adaptive tolerance windows around a learned pulse width.
//!
//! Nothing about the incoming signal is known up front: the first valid
//! duration a band sees becomes its center, and the acceptance window is
//! derived from it. A rail owns two value bands (short and long pulses)
//! plus one open-ended band for the separator pulse.

use crate::constants::{BAND_MAX_D, BAND_MIN_D, MAX_DURATION};

/// One tolerance window: a center duration with lower and upper bounds.
///
/// Either all three bounds are zero (nothing learned yet) or
/// `0 < inf <= mid <= sup`. `got_it` holds the outcome of the most recent
/// test, so a caller can probe several bands and then look at who took
/// the value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, defmt::Format)]
pub struct Band {
    pub(crate) inf: u16,
    pub(crate) mid: u16,
    pub(crate) sup: u16,
    pub(crate) got_it: bool,
}

impl Band {
    /// A band that has learned nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inf: 0,
            mid: 0,
            sup: 0,
            got_it: false,
        }
    }

    /// Forget the learned center and bounds.
    pub fn reset(&mut self) {
        self.inf = 0;
        self.mid = 0;
        self.sup = 0;
    }

    /// True once a center duration has been learned.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.mid != 0
    }

    /// Learn a value-pulse center: window is `d` ±25%. Durations outside
    /// [`BAND_MIN_D`], [`BAND_MAX_D`] are rejected and leave the band
    /// unset.
    pub fn init(&mut self, d: u16) -> bool {
        if (BAND_MIN_D..=BAND_MAX_D).contains(&d) {
            let quarter = d >> 2;
            self.mid = d;
            self.inf = d - quarter;
            self.sup = d + quarter;
            self.got_it = true;
        } else {
            self.got_it = false;
        }
        self.got_it
    }

    /// Learn a separator center: separators only have a meaningful lower
    /// bound (5/8 of the observed duration); anything longer still counts.
    pub fn init_sep(&mut self, d: u16) -> bool {
        self.mid = d;
        self.inf = (d >> 1) + (d >> 3);
        self.sup = MAX_DURATION;
        self.got_it = true;
        true
    }

    /// Test `d` against the window. An unset band accepts nothing.
    pub fn test_value(&mut self, d: u16) -> bool {
        self.got_it = self.is_set() && self.contains(d);
        self.got_it
    }

    /// Test `d`, except that an unset band learns `d` instead of testing.
    /// The asymmetry is deliberate: it is what bootstraps classification
    /// from the very first pulse of a frame.
    pub fn test_value_init_if_needed(&mut self, d: u16) -> bool {
        if self.is_set() {
            self.got_it = self.contains(d);
            self.got_it
        } else {
            self.init(d)
        }
    }

    const fn contains(&self, d: u16) -> bool {
        self.inf <= d && d <= self.sup
    }
}
