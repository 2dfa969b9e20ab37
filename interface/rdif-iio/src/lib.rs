#![no_std]

extern crate alloc;

use alloc::boxed::Box;

pub use rdif_base::{DriverGeneric, ErrorBase};

pub type Hardware = Box<dyn Interface>;

/// Physical quantity a channel measures or drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanType {
    Voltage,
    Current,
    AltVoltage,
    Temp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChanSpec {
    pub kind: ChanType,
    pub channel: usize,
    pub output: bool,
}

impl ChanSpec {
    pub const fn output(kind: ChanType, channel: usize) -> Self {
        Self {
            kind,
            channel,
            output: true,
        }
    }
}

/// Semantic class of a raw read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanInfo {
    Raw,
    Scale,
    Offset,
    Frequency,
    Phase,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IioError {
    #[error("IO error")]
    Io,
    #[error("Busy")]
    Busy,
    #[error("Invalid value {val} for {mask:?}")]
    InvalidValue { val: i64, mask: ChanInfo },
    #[error("{0:?} not supported")]
    NotSupported(ChanInfo),
}

pub trait WriteRaw {
    /// Writes `val` (integer part) and `val2` (fractional part) tagged with `mask`.
    fn write_raw(
        &mut self,
        chan: &ChanSpec,
        val: i64,
        val2: i64,
        mask: ChanInfo,
    ) -> Result<(), IioError>;
}

pub trait Interface: DriverGeneric {
    fn name(&self) -> &str;

    fn channels(&self) -> &[ChanSpec];

    fn channel(&self, index: usize) -> Option<&ChanSpec> {
        self.channels().iter().find(|c| c.channel == index)
    }

    /// If not supported, returns None
    fn raw_writer(&mut self) -> Option<&mut dyn WriteRaw> {
        None
    }
}
