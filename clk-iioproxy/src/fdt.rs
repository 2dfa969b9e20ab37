//! Configuration nodes read from a flattened device tree.

use alloc::vec::Vec;
use core::{ffi::CStr, ptr::NonNull};

pub use fdt_parser::{Fdt, Node};

use crate::{NodeId, NodeProps, Phandle, Status, error::ProbeError};

/// A device tree node with the identity [`System`] gave it.
#[derive(Clone)]
pub struct FdtNode<'a> {
    id: NodeId,
    pub node: Node<'a>,
}

impl FdtNode<'_> {
    pub fn phandle(&self) -> Option<Phandle> {
        self.node.phandle()
    }

    fn raw(&self, name: &str) -> Option<&[u8]> {
        self.node.find_property(name).map(|p| p.raw_value())
    }
}

/// Big-endian cell `index` of a property value.
fn cell(raw: &[u8], index: usize) -> Option<u32> {
    let bytes = raw.chunks_exact(4).nth(index)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

impl NodeProps for FdtNode<'_> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        self.node.name()
    }

    fn status(&self) -> Status {
        self.node.status().unwrap_or(Status::Okay)
    }

    fn read_u32(&self, name: &str) -> Option<u32> {
        cell(self.raw(name)?, 0)
    }

    fn read_string(&self, name: &str) -> Option<&str> {
        CStr::from_bytes_until_nul(self.raw(name)?)
            .ok()?
            .to_str()
            .ok()
    }

    fn parse_phandle(&self, name: &str, index: usize) -> Option<Phandle> {
        cell(self.raw(name)?, index).map(Phandle::from)
    }

    fn is_compatible(&self, compatible: &str) -> bool {
        self.node.compatibles().any(|c| c == compatible)
    }
}

/// A device tree blob and the node ids handed out for it.
///
/// Ids are assigned once, in tree order, so a node keeps its id across
/// repeated [`System::nodes`] calls and a failed node can be probed again.
/// The blob must stay mapped for as long as the `System` and its nodes live.
pub struct System {
    fdt_addr: NonNull<u8>,
    node_ids: Vec<NodeId>,
}

unsafe impl Send for System {}

impl System {
    pub fn new(fdt_addr: NonNull<u8>) -> Result<Self, ProbeError> {
        let fdt = Fdt::from_ptr(fdt_addr)?;
        let node_ids = fdt.all_nodes().map(|_| NodeId::new()).collect();
        Ok(Self { fdt_addr, node_ids })
    }

    /// Every node of the tree, disabled ones included.
    pub fn nodes(&self) -> Result<Vec<FdtNode<'static>>, ProbeError> {
        let fdt: Fdt<'static> = Fdt::from_ptr(self.fdt_addr)?;
        Ok(fdt
            .all_nodes()
            .zip(&self.node_ids)
            .map(|(node, id)| FdtNode { id: *id, node })
            .collect())
    }

    pub fn find(&self, name: &str) -> Result<Option<FdtNode<'static>>, ProbeError> {
        Ok(self.nodes()?.into_iter().find(|n| n.name() == name))
    }
}
