use std::ptr::NonNull;

use clk_iioproxy::{Manager, NodeProps, PlatformBus, PlatformDevice, fdt::System, setup};
use log::{error, info};

mod dds;

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let fdt = include_bytes!("../../../data/iioproxy.dtb");
    let system = System::new(NonNull::new(fdt.as_ptr() as usize as _).unwrap()).unwrap();

    let mut bus = PlatformBus::new();
    for node in system.nodes().unwrap() {
        if !node.is_compatible("adi,ad9833") {
            continue;
        }
        bus.add(PlatformDevice::new(node.name(), node.phandle()))
            .bind_iio("ad9833", dds::Dds::new("ad9833"));
    }

    let mut manager = Manager::new(bus);
    manager.register_add(setup::register());

    let bound = manager.probe_fdt(&system).unwrap();
    info!("bound {bound} clock nodes");

    let clocks = manager.clocks_mut();
    for name in ["refclk", "clk-orphan"] {
        let Some(clk) = clocks.get(name) else {
            error!("clock {name} missing");
            continue;
        };
        for rate in [12_000_000, 40_000_000] {
            match clocks.set_rate(clk, rate) {
                Ok(()) => info!("{name}: set {rate} Hz"),
                Err(e) => error!("{name}: set {rate} Hz failed: {e}"),
            }
        }
        info!(
            "{name}: rate {} Hz, accuracy {} ppb",
            clocks.get_rate(clk).unwrap_or_default(),
            clocks.get_accuracy(clk).unwrap_or_default()
        );
    }

    manager.shutdown();
    info!("clocks left after shutdown: {}", manager.clocks().len());
}
