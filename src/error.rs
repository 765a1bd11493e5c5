use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for this crate.
///
/// Signal-level problems (unclassifiable pulses, desynchronized rails,
/// ring overflow, decode rule violations) are not errors in this sense:
/// they are absorbed by the section recognizer and the decoders and at
/// worst show up as a raw or filtered-out result. `Error` covers only
/// setting up the receiver itself.
#[derive(Debug, Display, Error)]
pub enum Error {
    // `#[error(not(source))]` tells `derive_more` that
    // `embassy_executor::SpawnError` does not implement
    // `core::error::Error`.
    /// The edge task could not be spawned.
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    /// The pin's shared state is already driving another receiver.
    #[display("a receiver is already active on this pin")]
    ReceiverBusy,
}
