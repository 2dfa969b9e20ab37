#![no_std]

extern crate alloc;

mod device;
pub mod error;
pub mod fdt;
mod manager;
pub mod node;
pub mod proxy;
pub mod register;
pub mod resolver;
pub mod setup;
pub mod tree;

#[cfg(test)]
mod mock;

pub use device::*;
pub use manager::*;
pub use node::{Node, NodeId, NodeProps, Phandle, Status};
pub use proxy::IioProxyClock;
pub use rdif_base::{DriverGeneric, ErrorBase, lock};
pub use rdif_clk as clk;
pub use rdif_iio as iio;
pub use tree::{ClkHandle, ClkInitData, ClockTree};
