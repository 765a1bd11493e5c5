//! Generic 433 MHz OOK remote-control decoding for the Raspberry Pi Pico.
//!
//! Cheap 433 MHz receiver modules output a binary line: high while the
//! remote's carrier is on, low while it is off. The pulse widths carry
//! the data, under one of a handful of line codings (tri-bit, inverted
//! tri-bit, Manchester). This crate timestamps the line's edges, learns
//! the pulse widths of whatever remote is talking, reconstructs the
//! transmitted bits under every plausible coding, and hands the caller
//! the best candidates — without knowing any protocol up front.
//!
//! The decoding core ([`band`], [`rail`], [`track`], [`decoder`],
//! [`bit_vector`], [`edge_ring`], [`silence`]) is pure and builds on the
//! host with the `host` feature, which is how the test suite runs. The
//! [`receiver`] module binds the core to a GPIO pin through an Embassy
//! task and only builds for a board target.
#![cfg_attr(not(feature = "host"), no_std)]
#![warn(
    clippy::pedantic,
    clippy::use_self,
    missing_docs,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::cast_possible_truncation,
    reason = "duration arithmetic is bounds-checked where it matters"
)]

// Compile-time checks: exactly one board must be selected (unless testing
// with the host feature).
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

pub mod band;
pub mod bit_vector;
pub mod constants;
pub mod decoder;
pub mod edge_ring;
pub mod rail;
pub mod silence;
pub mod track;

#[cfg(feature = "host")]
pub mod sim;

#[cfg(not(feature = "host"))]
mod error;
#[cfg(not(feature = "host"))]
pub mod receiver;

#[cfg(not(feature = "host"))]
pub use error::{Error, Result};

/// Host builds cannot fail receiver setup; the error type is vestigial.
#[cfg(feature = "host")]
pub type Error = core::convert::Infallible;
/// A specialized `Result` where the error is this crate's `Error` type.
#[cfg(feature = "host")]
pub type Result<T, E = Error> = core::result::Result<T, E>;
