//! One-shot lookup of the device backing a phandle reference.

use alloc::sync::Arc;

use log::info;

use crate::{DeviceDirectory, IioWeak, Phandle, PlatformDevice};

/// Finds the first device whose node is `phandle` and which has a driver bound.
///
/// A device whose node matches but has not finished probing is skipped.
pub fn resolve(
    devices: &dyn DeviceDirectory,
    phandle: Option<Phandle>,
) -> Option<Arc<PlatformDevice>> {
    let phandle = phandle?;
    let mut found = None;

    devices.for_each_dev(&mut |dev| {
        let state = dev.lock();
        if state.of_node == Some(phandle) && state.driver.is_some() {
            found = Some(dev.clone());
            true
        } else {
            false
        }
    });

    if let Some(dev) = &found {
        info!("found platform device [{}] for {phandle:?}", dev.descriptor.name);
    }
    found
}

/// IIO device published by the driver bound to `dev`.
pub fn iio_device(dev: &PlatformDevice) -> Option<IioWeak> {
    let weak = dev.drvdata()?;
    if let Some(iio) = weak.upgrade() {
        info!(
            "found IIO device for platform device with name {}",
            iio.lock().name()
        );
    }
    Some(weak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlatformBus, mock::MockIio};

    #[test]
    fn test_no_handle() {
        let mut bus = PlatformBus::new();
        let dev = bus.add(PlatformDevice::new("dds", Some(Phandle::from(1u32))));
        dev.bind_iio("mock", MockIio::new("dds"));

        assert!(resolve(&bus, None).is_none());
    }

    #[test]
    fn test_unbound_match_skipped() {
        let mut bus = PlatformBus::new();
        bus.add(PlatformDevice::new("dds", Some(Phandle::from(1u32))));

        assert!(resolve(&bus, Some(Phandle::from(1u32))).is_none());
    }

    #[test]
    fn test_bound_match() {
        let mut bus = PlatformBus::new();
        bus.add(PlatformDevice::new("other", Some(Phandle::from(2u32))))
            .bind_iio("mock", MockIio::new("other"));
        let dev = bus.add(PlatformDevice::new("dds", Some(Phandle::from(1u32))));
        dev.bind_iio("mock", MockIio::new("dds"));

        let found = resolve(&bus, Some(Phandle::from(1u32))).unwrap();
        assert_eq!(found.descriptor.device_id, dev.descriptor.device_id);

        let iio = iio_device(&found).unwrap().upgrade().unwrap();
        assert_eq!(iio.lock().name(), "dds");
    }

    #[test]
    fn test_first_match_wins() {
        let mut bus = PlatformBus::new();
        bus.add(PlatformDevice::new("unbound", Some(Phandle::from(1u32))));
        let first = bus.add(PlatformDevice::new("first", Some(Phandle::from(1u32))));
        first.bind("no-iio", None);
        bus.add(PlatformDevice::new("second", Some(Phandle::from(1u32))))
            .bind_iio("mock", MockIio::new("second"));

        let found = resolve(&bus, Some(Phandle::from(1u32))).unwrap();
        assert_eq!(found.descriptor.name, "first");
        assert!(iio_device(&found).is_none());
    }
}
