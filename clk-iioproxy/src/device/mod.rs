use alloc::{
    boxed::Box,
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};

use log::debug;
use rdif_base::lock::{Lock, LockWeak};
use spin::{Mutex, MutexGuard};

pub use descriptor::{Descriptor, DeviceId};

use crate::Phandle;

mod descriptor;

pub type IioDevice = Lock<rdif_iio::Hardware>;
pub type IioWeak = LockWeak<rdif_iio::Hardware>;

/// Driver attached to a platform device.
pub struct BoundDriver {
    pub name: &'static str,
    /// Driver data; `None` for drivers that do not publish an IIO device.
    pub data: Option<IioDevice>,
}

pub struct DeviceState {
    pub of_node: Option<Phandle>,
    pub driver: Option<BoundDriver>,
}

pub struct PlatformDevice {
    pub descriptor: Descriptor,
    state: Mutex<DeviceState>,
}

impl PlatformDevice {
    pub fn new(name: &str, of_node: Option<Phandle>) -> Self {
        Self {
            descriptor: Descriptor {
                device_id: DeviceId::new(),
                name: name.to_string(),
            },
            state: Mutex::new(DeviceState {
                of_node,
                driver: None,
            }),
        }
    }

    /// Per-device lock, held while the device is inspected or (un)bound.
    pub fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock()
    }

    pub fn bind(&self, driver: &'static str, data: Option<rdif_iio::Hardware>) {
        debug!("[{}] bind driver {driver}", self.descriptor.name);
        self.lock().driver = Some(BoundDriver {
            name: driver,
            data: data.map(Lock::new),
        });
    }

    pub fn bind_iio<T: rdif_iio::Interface + 'static>(&self, driver: &'static str, dev: T) {
        self.bind(driver, Some(Box::new(dev)));
    }

    /// Detaches the driver. Weak references to its IIO device stop resolving.
    pub fn unbind(&self) -> Option<BoundDriver> {
        debug!("[{}] unbind", self.descriptor.name);
        self.lock().driver.take()
    }

    pub fn is_bound(&self) -> bool {
        self.lock().driver.is_some()
    }

    pub fn drvdata(&self) -> Option<IioWeak> {
        self.lock()
            .driver
            .as_ref()
            .and_then(|d| d.data.as_ref())
            .map(Lock::weak)
    }
}

/// Searchable set of platform devices.
pub trait DeviceDirectory {
    /// Visits devices in registry order until `f` returns `true`.
    ///
    /// Returns whether the walk was stopped by `f`.
    fn for_each_dev(&self, f: &mut dyn FnMut(&Arc<PlatformDevice>) -> bool) -> bool;
}

#[derive(Default)]
pub struct PlatformBus {
    devices: Vec<Arc<PlatformDevice>>,
}

impl PlatformBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, device: PlatformDevice) -> Arc<PlatformDevice> {
        let device = Arc::new(device);
        self.devices.push(device.clone());
        device
    }

    pub fn remove(&mut self, id: DeviceId) -> Option<Arc<PlatformDevice>> {
        let pos = self
            .devices
            .iter()
            .position(|d| d.descriptor.device_id == id)?;
        Some(self.devices.remove(pos))
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<PlatformDevice>> {
        self.devices
            .iter()
            .find(|d| d.descriptor.name == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|d| d.descriptor.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DeviceDirectory for PlatformBus {
    fn for_each_dev(&self, f: &mut dyn FnMut(&Arc<PlatformDevice>) -> bool) -> bool {
        for dev in &self.devices {
            if f(dev) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIio;

    #[test]
    fn test_unbind_releases_drvdata() {
        let dev = PlatformDevice::new("dds", Some(Phandle::from(3u32)));
        dev.bind_iio("mock-dds", MockIio::new("dds"));
        let weak = dev.drvdata().unwrap();
        assert!(weak.upgrade().is_some());

        let old = dev.unbind().unwrap();
        assert_eq!(old.name, "mock-dds");
        drop(old);
        assert!(weak.upgrade().is_none());
        assert!(dev.drvdata().is_none());
    }

    #[test]
    fn test_bus_walk_stops() {
        let mut bus = PlatformBus::new();
        bus.add(PlatformDevice::new("a", None));
        let b = bus.add(PlatformDevice::new("b", None));
        bus.add(PlatformDevice::new("c", None));

        let mut seen = Vec::new();
        let stopped = bus.for_each_dev(&mut |d| {
            seen.push(d.descriptor.name.clone());
            d.descriptor.name == "b"
        });
        assert!(stopped);
        assert_eq!(seen, ["a", "b"]);

        assert!(bus.remove(b.descriptor.device_id).is_some());
        assert_eq!(bus.names(), ["a", "c"]);
    }
}
