use alloc::{collections::btree_map::BTreeMap, vec::Vec};

use rdif_base::custom_type;

use crate::{
    DeviceDirectory, NodeId, NodeProps,
    error::SetupError,
    tree::{ClkHandle, ClockTree},
};

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ProbePriority(pub usize);

impl ProbePriority {
    pub const CLK: ProbePriority = ProbePriority(6);
}

impl From<usize> for ProbePriority {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// What a driver gets to work with while binding one node.
pub struct ProbeCtx<'a> {
    pub node: &'a dyn NodeProps,
    pub devices: &'a dyn DeviceDirectory,
    pub clocks: &'a mut ClockTree,
}

pub type FnOnProbe = fn(ctx: ProbeCtx<'_>) -> Result<ClkHandle, SetupError>;
pub type FnOnRemove = fn(node: NodeId, handle: ClkHandle, clocks: &mut ClockTree);

#[derive(Clone)]
pub struct DriverRegister {
    pub name: &'static str,
    pub priority: ProbePriority,
    pub compatibles: &'static [&'static str],
    pub on_probe: FnOnProbe,
    pub on_remove: FnOnRemove,
}

impl DriverRegister {
    pub fn matches(&self, node: &dyn NodeProps) -> bool {
        self.compatibles.iter().any(|c| node.is_compatible(c))
    }
}

custom_type!(RegisterId, usize, "{:?}");

#[derive(Default)]
pub struct RegisterContainer {
    id_iter: usize,
    registers: BTreeMap<RegisterId, DriverRegister>,
}

impl RegisterContainer {
    pub const fn new() -> Self {
        Self {
            registers: BTreeMap::new(),
            id_iter: 0,
        }
    }

    pub fn add(&mut self, register: DriverRegister) -> RegisterId {
        self.id_iter += 1;
        let id = RegisterId(self.id_iter);
        self.registers.insert(id, register);
        id
    }

    pub fn append(&mut self, registers: &[DriverRegister]) {
        for one in registers {
            self.add(one.clone());
        }
    }

    pub fn get(&self, id: RegisterId) -> Option<&DriverRegister> {
        self.registers.get(&id)
    }

    /// Highest priority (lowest value) register matching `node`.
    pub fn find(&self, node: &dyn NodeProps) -> Option<(RegisterId, &DriverRegister)> {
        self.registers
            .iter()
            .filter(|(_, r)| r.matches(node))
            .min_by_key(|(id, r)| (r.priority, **id))
            .map(|(id, r)| (*id, r))
    }

    pub fn sorted(&self) -> Vec<(RegisterId, &DriverRegister)> {
        let mut out: Vec<_> = self.registers.iter().map(|(id, r)| (*id, r)).collect();
        out.sort_by_key(|(id, r)| (r.priority, *id));
        out
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
