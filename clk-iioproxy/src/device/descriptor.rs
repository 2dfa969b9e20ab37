use alloc::string::String;
use core::sync::atomic::{AtomicU64, Ordering};

use rdif_base::custom_type;

custom_type!(#[doc = "Platform device id"], DeviceId, u64, "dev{}");

#[derive(Default, Debug, Clone)]
pub struct Descriptor {
    pub device_id: DeviceId,
    pub name: String,
}

static ITER: AtomicU64 = AtomicU64::new(0);

impl DeviceId {
    pub fn new() -> Self {
        Self(ITER.fetch_add(1, Ordering::SeqCst))
    }
}
