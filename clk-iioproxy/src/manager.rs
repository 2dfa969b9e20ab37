use alloc::vec::Vec;

use log::{debug, warn};

use crate::{
    NodeId, NodeProps, PlatformBus, Status,
    error::ProbeError,
    fdt::System,
    register::{DriverRegister, ProbeCtx, RegisterContainer, RegisterId},
    tree::{ClkHandle, ClockTree},
};

struct Bound {
    node: NodeId,
    register: RegisterId,
    clock: ClkHandle,
}

/// Owns the driver registers, the device bus and the clock tree.
///
/// Nothing here is global: create one at start-up, feed it nodes with
/// [`Manager::probe`], and call [`Manager::shutdown`] before dropping it.
#[derive(Default)]
pub struct Manager {
    pub registers: RegisterContainer,
    bus: PlatformBus,
    clocks: ClockTree,
    bound: Vec<Bound>,
}

impl Manager {
    pub fn new(bus: PlatformBus) -> Self {
        Self {
            bus,
            ..Default::default()
        }
    }

    pub fn register_add(&mut self, register: DriverRegister) -> RegisterId {
        self.registers.add(register)
    }

    pub fn register_append(&mut self, registers: &[DriverRegister]) {
        self.registers.append(registers)
    }

    /// Binds every enabled, not yet bound node that a register matches.
    ///
    /// Failed nodes stay unbound so a later call can retry them. Returns the
    /// number of nodes bound by this call.
    pub fn probe<N: NodeProps>(&mut self, nodes: &[N]) -> usize {
        let mut count = 0;
        for node in nodes {
            if matches!(node.status(), Status::Disabled) || self.is_bound(node.id()) {
                continue;
            }
            match self.probe_node(node) {
                Ok(_) => count += 1,
                Err(ProbeError::NotMatched(_)) => {}
                Err(e) => warn!("Probe [{}] failed: {e}", node.name()),
            }
        }
        count
    }

    /// Probes the nodes of a device tree blob, see [`Manager::probe`].
    pub fn probe_fdt(&mut self, system: &System) -> Result<usize, ProbeError> {
        let nodes = system.nodes()?;
        Ok(self.probe(&nodes))
    }

    pub fn probe_node(&mut self, node: &dyn NodeProps) -> Result<ClkHandle, ProbeError> {
        if self.is_bound(node.id()) {
            return Err(ProbeError::AlreadyBound(node.id()));
        }
        let (register_id, register) = self
            .registers
            .find(node)
            .ok_or(ProbeError::NotMatched(node.id()))?;

        debug!("Probe [{}]->[{}]", node.name(), register.name);
        let clock = (register.on_probe)(ProbeCtx {
            node,
            devices: &self.bus,
            clocks: &mut self.clocks,
        })?;

        self.bound.push(Bound {
            node: node.id(),
            register: register_id,
            clock,
        });
        Ok(clock)
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), ProbeError> {
        let pos = self
            .bound
            .iter()
            .position(|b| b.node == node)
            .ok_or(ProbeError::NotBound(node))?;
        let bound = self.bound.remove(pos);
        self.unbind(bound);
        Ok(())
    }

    /// Removes every bound node, most recent first.
    pub fn shutdown(&mut self) {
        while let Some(bound) = self.bound.pop() {
            self.unbind(bound);
        }
    }

    fn unbind(&mut self, bound: Bound) {
        match self.registers.get(bound.register) {
            Some(register) => {
                debug!("Remove [{:?}]->[{}]", bound.node, register.name);
                (register.on_remove)(bound.node, bound.clock, &mut self.clocks);
            }
            None => warn!("{:?}: register gone, clock kept", bound.node),
        }
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.bound.iter().any(|b| b.node == node)
    }

    pub fn clock_of(&self, node: NodeId) -> Option<ClkHandle> {
        self.bound.iter().find(|b| b.node == node).map(|b| b.clock)
    }

    pub fn bus(&self) -> &PlatformBus {
        &self.bus
    }

    pub fn clocks(&self) -> &ClockTree {
        &self.clocks
    }

    pub fn clocks_mut(&mut self) -> &mut ClockTree {
        &mut self.clocks
    }
}
