//! Builds proxy clocks from configuration nodes.

use alloc::string::String;

use log::{debug, info, warn};
use rdif_clk::ClkError;

use crate::{
    DeviceDirectory, NodeId, NodeProps,
    error::SetupError,
    proxy::{self, IioProxyClock},
    register::{DriverRegister, ProbeCtx, ProbePriority},
    resolver,
    tree::{ClkHandle, ClkInitData, ClockTree},
};

pub const COMPATIBLE: &str = "iioproxy-clock";

pub const PROP_CLOCK_FREQUENCY: &str = "clock-frequency";
pub const PROP_CLOCK_ACCURACY: &str = "clock-accuracy";
pub const PROP_CLOCK_OUTPUT_NAMES: &str = "clock-output-names";
pub const PROP_IIOHWDEV: &str = "iiohwdev";

pub fn register() -> DriverRegister {
    DriverRegister {
        name: "of_iioproxy_clk",
        priority: ProbePriority::CLK,
        compatibles: &[COMPATIBLE],
        on_probe: probe,
        on_remove: remove,
    }
}

fn probe(ctx: ProbeCtx<'_>) -> Result<ClkHandle, SetupError> {
    of_setup(ctx.node, ctx.devices, ctx.clocks)
}

fn remove(node: NodeId, handle: ClkHandle, clocks: &mut ClockTree) {
    teardown(node, handle, clocks);
}

/// Registers the proxy clock described by `node` and applies its initial rate.
///
/// A missing `iiohwdev` device is not an error: the clock is registered
/// and reports `NoChannel` on rate changes until it is set up again.
pub fn of_setup(
    node: &dyn NodeProps,
    devices: &dyn DeviceDirectory,
    clocks: &mut ClockTree,
) -> Result<ClkHandle, SetupError> {
    let initial_rate = node
        .read_u32(PROP_CLOCK_FREQUENCY)
        .ok_or(SetupError::MissingConfig(PROP_CLOCK_FREQUENCY))?;
    let accuracy = node.read_u32(PROP_CLOCK_ACCURACY).unwrap_or(0);
    let clk_name = owned_name(
        node.read_string(PROP_CLOCK_OUTPUT_NAMES)
            .unwrap_or(node.name()),
    )?;

    let phandle = node.parse_phandle(PROP_IIOHWDEV, 0);
    if phandle.is_some() {
        info!("[{clk_name}] found {PROP_IIOHWDEV} entry");
    }
    let indio_dev =
        resolver::resolve(devices, phandle).and_then(|dev| resolver::iio_device(&dev));

    let clk = IioProxyClock::new(initial_rate.into(), accuracy.into()).with_channel(indio_dev);
    let handle = proxy::register_clock(clocks, ClkInitData::new(&clk_name), clk)
        .map_err(|source| SetupError::RegistrationFailed {
            name: clk_name.clone(),
            source,
        })?;

    if let Err(e) = clocks.add_provider(node.id(), handle) {
        proxy::unregister(clocks, Some(handle));
        return Err(SetupError::ProviderAdvertiseFailed(e));
    }

    if let Some(clk) = proxy::proxy_mut(clocks, handle) {
        clk.force_rate(0);
    }
    match clocks.set_rate(handle, initial_rate.into()) {
        Ok(()) => {}
        Err(ClkError::NoChannel) => {
            warn!("[{clk_name}] IIO device not bound yet, rate {initial_rate} not applied");
            if let Some(clk) = proxy::proxy_mut(clocks, handle) {
                clk.force_rate(initial_rate.into());
            }
        }
        Err(e) => {
            teardown(node.id(), handle, clocks);
            return Err(SetupError::InitialRate(e));
        }
    }

    debug!("[{clk_name}] registered as {handle:?} at {initial_rate} Hz");
    Ok(handle)
}

fn owned_name(name: &str) -> Result<String, SetupError> {
    let mut owned = String::new();
    owned
        .try_reserve_exact(name.len())
        .map_err(|_| SetupError::AllocationFailure)?;
    owned.push_str(name);
    Ok(owned)
}

/// Withdraws the provider, then unregisters and frees the clock.
pub fn teardown(node: NodeId, handle: ClkHandle, clocks: &mut ClockTree) {
    clocks.del_provider(node);
    proxy::unregister(clocks, Some(handle));
}
