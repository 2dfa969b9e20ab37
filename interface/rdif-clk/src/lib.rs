#![no_std]

extern crate alloc;

use core::any::Any;

pub use alloc::boxed::Box;
use alloc::string::String;
pub use rdif_base::{DriverGeneric, ErrorBase};
use rdif_base::custom_type;
use rdif_iio::IioError;

pub type Hardware = Box<dyn Interface>;

custom_type!(#[doc = "Framework flags passed through at registration"], ClkFlags, u64, "{:#x}");

impl ClkFlags {
    pub const NONE: ClkFlags = ClkFlags(0);
}

/// Operation table of a clock registered in a clock tree.
///
/// The tree calls these on behalf of consumers; it serializes calls against
/// the same clock, so implementations do no locking of their own.
pub trait Interface: DriverGeneric {
    /// Current rate, derived from the parent rate where that applies.
    fn recalc_rate(&self, parent_rate: u64) -> u64;

    /// Closest rate the clock can produce for `rate`. Must not touch hardware.
    fn round_rate(&self, rate: u64, parent_rate: &mut u64) -> Result<u64, ClkError>;

    fn set_rate(&mut self, rate: u64, parent_rate: u64) -> Result<(), ClkError>;

    fn recalc_accuracy(&self, _parent_accuracy: u64) -> u64 {
        0
    }

    fn raw_any(&self) -> Option<&dyn Any> {
        None
    }

    fn raw_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClkError {
    #[error("no backing channel attached")]
    NoChannel,
    #[error("channel {channel} has no write function attached")]
    NoCapability { channel: usize },
    #[error("rate {0} not representable by the channel")]
    InvalidRate(u64),
    #[error("hardware write failed: {0}")]
    Hardware(#[from] IioError),
    #[error("clock `{0}` already registered")]
    Exists(String),
    #[error("clock not found")]
    NotFound,
    #[error("parent chain of clock `{0}` loops back on itself")]
    ParentLoop(String),
    #[error("provider already registered for node")]
    ProviderExists,
}
