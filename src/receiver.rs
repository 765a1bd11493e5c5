//! A device abstraction for 433 MHz OOK receiver modules.
//!
//! See [`Rf433`] for usage examples.

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::gpio::{AnyPin, Input, Pin, Pull};
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Instant;
use portable_atomic::{AtomicBool, Ordering};

use crate::constants::MAX_DURATION;
use crate::decoder::{Convention, DecoderChain, Filter};
use crate::edge_ring::{Edge, EdgeRing, Level};
use crate::rail::Mood;
use crate::silence::ActivityWindow;
use crate::track::{Track, TrackState};
use crate::{Error, Result};

/// State shared between the edge task and the [`Rf433`] facade.
///
/// See [`Rf433`] for usage examples.
pub struct Rf433Static {
    ring: EdgeRing,
    window: Mutex<CriticalSectionRawMutex, RefCell<ActivityWindow>>,
    recording: AtomicBool,
    watching_silence: AtomicBool,
    kick: Signal<CriticalSectionRawMutex, ()>,
    claimed: AtomicBool,
}

/// A device abstraction for an OOK receiver on one GPIO pin.
///
/// The receiver owns a [`Track`]; a background task timestamps the pin's
/// edges and hands them over through a small ring buffer. Only one
/// receiver may be active per pin.
///
/// # Examples
/// ```no_run
/// # #![no_std]
/// # #![no_main]
/// # #[panic_handler]
/// # fn panic(_: &core::panic::PanicInfo) -> ! { loop {} }
/// # use embassy_executor::Spawner;
/// use rf433_kit::decoder::{Convention, Filter};
/// use rf433_kit::rail::Mood;
/// use rf433_kit::receiver::{Rf433, Rf433Static};
///
/// # async fn example(p: embassy_rp::Peripherals, spawner: Spawner) -> rf433_kit::Result<()> {
/// static RF433_STATIC: Rf433Static = Rf433::new_static();
/// let mut rf = Rf433::new(p.PIN_2, &RF433_STATIC, spawner, Mood::default())?;
///
/// loop {
///     rf.wait_data().await;
///     let chain = rf.get_data(Filter::NO_ERROR | Filter::DEDUP, Convention::Conv0);
///     for dec in &chain {
///         defmt::info!("{}: {=u16} bits: {}", dec.kind().letter(), dec.nb_bits(), dec.data());
///     }
///     rf.reset();
/// }
/// # }
/// ```
pub struct Rf433<'a> {
    shared: &'a Rf433Static,
    track: Track,
}

impl Rf433<'_> {
    /// Create the static resources shared with the edge task.
    ///
    /// See [`Rf433`] for usage examples.
    #[must_use]
    pub const fn new_static() -> Rf433Static {
        Rf433Static {
            ring: EdgeRing::new(),
            window: Mutex::new(RefCell::new(ActivityWindow::new())),
            recording: AtomicBool::new(false),
            watching_silence: AtomicBool::new(false),
            kick: Signal::new(),
            claimed: AtomicBool::new(false),
        }
    }

    /// Create a new receiver on `pin` and spawn its edge task. Recording
    /// starts disabled.
    ///
    /// # Errors
    /// Returns an error if the shared state already drives a receiver or
    /// the background task cannot be spawned.
    pub fn new<P: Pin>(
        pin: Peri<'static, P>,
        rf433_static: &'static Rf433Static,
        spawner: Spawner,
        mood: Mood,
    ) -> Result<Self> {
        if rf433_static.claimed.swap(true, Ordering::AcqRel) {
            return Err(Error::ReceiverBusy);
        }
        let any: Peri<'static, AnyPin> = pin.into();
        // OOK receiver modules drive the line themselves; no pull needed.
        spawner
            .spawn(edge_task(Input::new(any, Pull::None), rf433_static))
            .map_err(Error::TaskSpawn)?;
        Ok(Self {
            shared: rf433_static,
            track: Track::new(mood),
        })
    }

    /// Let the edge task feed the ring.
    pub fn activate_recording(&self) {
        self.shared.recording.store(true, Ordering::Release);
    }

    /// Stop feeding the ring; edges are discarded at the task.
    pub fn deactivate_recording(&self) {
        self.shared.recording.store(false, Ordering::Release);
    }

    /// Activate recording and drain pending edges into the track.
    /// Returns true iff a full frame is recorded; recording is then
    /// deactivated.
    pub fn do_events(&mut self) -> bool {
        self.activate_recording();
        if self.track.drain(&self.shared.ring) {
            self.deactivate_recording();
            info!(
                "RF433: frame recorded, ring high-water {=u8}",
                self.shared.ring.max_pending()
            );
            return true;
        }
        false
    }

    /// Wait until a full frame is recorded.
    pub async fn wait_data(&mut self) {
        loop {
            if self.do_events() {
                return;
            }
            self.shared.kick.wait().await;
        }
    }

    /// Close any in-progress section and process what was received.
    pub fn force_stop_recv(&mut self) {
        if self.track.state() == TrackState::Recv {
            self.track.force_stop();
            self.do_events();
        }
    }

    /// Build the decoder chain for the recorded frame, filtered. The
    /// caller owns the chain.
    #[must_use]
    pub fn get_data(&self, filter: Filter, convention: Convention) -> DecoderChain {
        self.track.get_data(filter, convention)
    }

    /// Return the track to waiting for an initialization pulse.
    pub fn reset(&mut self) {
        self.track.reset();
    }

    /// Wait until the channel looks free: enough recent edge widths in
    /// the plausible-signal range over a full observation window.
    pub async fn wait_free_433(&self) {
        self.shared.window.lock(|w| w.borrow_mut().reset());
        self.shared.watching_silence.store(true, Ordering::Release);
        loop {
            self.shared.kick.wait().await;
            if self.shared.window.lock(|w| w.borrow().is_idle()) {
                break;
            }
        }
        self.shared.watching_silence.store(false, Ordering::Release);
        info!("RF433: channel free");
    }
}

#[embassy_executor::task]
async fn edge_task(mut pin: Input<'static>, shared: &'static Rf433Static) -> ! {
    let mut last_edge = Instant::now();
    let mut is_high = pin.is_high();

    info!("RF433 edge task started");
    loop {
        pin.wait_for_any_edge().await;

        let now = Instant::now();
        let micros = now.duration_since(last_edge).as_micros();
        last_edge = now;
        let duration = micros.min(u64::from(MAX_DURATION)) as u16;

        // The level that just ended is whatever we were at. Toggle
        // instead of reading the pin, then cross-check: a mismatch means
        // a missed edge, and pushing the same level twice is exactly how
        // the track gets told about it.
        let ended = if is_high { Level::High } else { Level::Low };
        is_high = !is_high;
        let actually_high = pin.is_high();
        if is_high != actually_high {
            warn!("RF433: pin state mismatch (missed edge?)");
            is_high = actually_high;
        }

        if shared.watching_silence.load(Ordering::Acquire) {
            shared.window.lock(|w| w.borrow_mut().record(duration));
        }
        if shared.recording.load(Ordering::Acquire) {
            shared.ring.push(Edge {
                level: ended,
                duration,
            });
        }
        shared.kick.signal(());
    }
}
