//! Clock whose rate lives in an IIO frequency channel.
//!
//! The cached rate only ever changes after the channel accepted a write.

use alloc::{boxed::Box, string::String};
use core::any::Any;

use log::{error, warn};
use rdif_base::{DriverGeneric, ErrorBase, lock::LockWeak};
use rdif_clk::{ClkError, ClkFlags, Interface};
use rdif_iio::ChanInfo;

use crate::{
    IioWeak,
    tree::{ClkHandle, ClkInitData, ClockTree},
};

/// Channel index the rate is written to.
pub const CHANNEL: usize = 0;

pub struct IioProxyClock {
    current_rate: u64,
    fixed_accuracy: u64,
    indio_dev: Option<IioWeak>,
}

impl IioProxyClock {
    pub fn new(current_rate: u64, fixed_accuracy: u64) -> Self {
        Self {
            current_rate,
            fixed_accuracy,
            indio_dev: None,
        }
    }

    pub fn with_channel(mut self, indio_dev: Option<IioWeak>) -> Self {
        self.indio_dev = indio_dev;
        self
    }

    /// Whether the backing IIO device is still alive.
    pub fn has_channel(&self) -> bool {
        self.indio_dev.as_ref().is_some_and(|d| !d.is_released())
    }

    /// Overwrites the cached rate without touching hardware.
    pub(crate) fn force_rate(&mut self, rate: u64) {
        self.current_rate = rate;
    }

    fn write_frequency(&self, rate: u64) -> Result<(), ClkError> {
        let dev = self
            .indio_dev
            .as_ref()
            .and_then(LockWeak::upgrade)
            .ok_or(ClkError::NoChannel)?;
        let mut dev = dev.lock();
        let name = String::from(dev.name());

        let Some(chan) = dev.channel(CHANNEL).copied() else {
            error!("IIO device {name} has no channel {CHANNEL}");
            return Err(ClkError::NoCapability { channel: CHANNEL });
        };
        let Some(writer) = dev.raw_writer() else {
            error!("IIO channel {CHANNEL} of {name} has no write function attached");
            return Err(ClkError::NoCapability { channel: CHANNEL });
        };
        let val = i64::try_from(rate).map_err(|_| ClkError::InvalidRate(rate))?;

        writer
            .write_raw(&chan, val, 0, ChanInfo::Frequency)
            .map_err(|e| {
                error!("IIO device {name} rejected rate {rate}: {e}");
                ClkError::Hardware(e)
            })
    }
}

impl DriverGeneric for IioProxyClock {
    fn open(&mut self) -> Result<(), ErrorBase> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ErrorBase> {
        Ok(())
    }
}

impl Interface for IioProxyClock {
    fn recalc_rate(&self, _parent_rate: u64) -> u64 {
        self.current_rate
    }

    fn round_rate(&self, rate: u64, _parent_rate: &mut u64) -> Result<u64, ClkError> {
        Ok(rate)
    }

    fn set_rate(&mut self, rate: u64, _parent_rate: u64) -> Result<(), ClkError> {
        if rate == self.current_rate {
            return Ok(());
        }
        self.write_frequency(rate)?;
        self.current_rate = rate;
        Ok(())
    }

    fn recalc_accuracy(&self, _parent_accuracy: u64) -> u64 {
        self.fixed_accuracy
    }

    fn raw_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn raw_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

pub(crate) fn register_clock(
    tree: &mut ClockTree,
    init: ClkInitData,
    clk: IioProxyClock,
) -> Result<ClkHandle, ClkError> {
    tree.register(init, Box::new(clk))
}

pub fn register_with_accuracy(
    tree: &mut ClockTree,
    name: &str,
    parent_name: Option<&str>,
    flags: ClkFlags,
    current_rate: u64,
    fixed_accuracy: u64,
) -> Result<ClkHandle, ClkError> {
    register_clock(
        tree,
        ClkInitData::new(name).parent(parent_name).flags(flags),
        IioProxyClock::new(current_rate, fixed_accuracy),
    )
}

pub fn register(
    tree: &mut ClockTree,
    name: &str,
    parent_name: Option<&str>,
    flags: ClkFlags,
    current_rate: u64,
) -> Result<ClkHandle, ClkError> {
    register_with_accuracy(tree, name, parent_name, flags, current_rate, 0)
}

/// Unregisters a proxy clock and frees it. `None` is a no-op.
pub fn unregister(tree: &mut ClockTree, handle: Option<ClkHandle>) {
    let Some(handle) = handle else {
        return;
    };
    if proxy(tree, handle).is_none() {
        warn!("{handle:?} is not an IIO proxy clock, left registered");
        return;
    }
    drop(tree.unregister(handle));
}

pub fn proxy(tree: &ClockTree, handle: ClkHandle) -> Option<&IioProxyClock> {
    tree.hw(handle)?.raw_any()?.downcast_ref()
}

pub fn proxy_mut(tree: &mut ClockTree, handle: ClkHandle) -> Option<&mut IioProxyClock> {
    tree.hw_mut(handle)?.raw_any_mut()?.downcast_mut()
}
