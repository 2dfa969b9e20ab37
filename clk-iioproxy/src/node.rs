//! Declarative configuration nodes.
//!
//! Drivers read their configuration through [`NodeProps`]. Device tree nodes
//! implement it in [`crate::fdt`]; [`Node`] is an in-memory implementation.

use alloc::{
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::sync::atomic::{AtomicU64, Ordering};

pub use fdt_parser::{Phandle, Status};
use rdif_base::custom_type;

custom_type!(#[doc = "Process-unique identity of a configuration node"], NodeId, u64, "node{}");

static ITER: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    pub fn new() -> Self {
        Self(ITER.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Debug, Clone)]
enum Property {
    U32(Vec<u32>),
    Strings(Vec<String>),
    Phandles(Vec<Phandle>),
}

pub trait NodeProps {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn status(&self) -> Status {
        Status::Okay
    }

    fn read_u32(&self, name: &str) -> Option<u32>;

    /// First string of a string-list property.
    fn read_string(&self, name: &str) -> Option<&str>;

    fn parse_phandle(&self, name: &str, index: usize) -> Option<Phandle>;

    fn is_compatible(&self, compatible: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    status: Status,
    compatibles: Vec<String>,
    props: BTreeMap<String, Property>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            id: NodeId::new(),
            name: name.to_string(),
            status: Status::Okay,
            compatibles: Vec::new(),
            props: BTreeMap::new(),
        }
    }

    pub fn compatible(mut self, compatible: &str) -> Self {
        self.compatibles.push(compatible.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.status = Status::Disabled;
        self
    }

    fn prop(mut self, name: &str, value: Property) -> Self {
        self.props.insert(name.to_string(), value);
        self
    }

    pub fn prop_u32(self, name: &str, value: u32) -> Self {
        self.prop(name, Property::U32(vec![value]))
    }

    pub fn prop_str(self, name: &str, value: &str) -> Self {
        self.prop(name, Property::Strings(vec![value.to_string()]))
    }

    pub fn prop_phandle(self, name: &str, value: u32) -> Self {
        self.prop(name, Property::Phandles(vec![Phandle::from(value)]))
    }
}

impl NodeProps for Node {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        self.status
    }

    fn read_u32(&self, name: &str) -> Option<u32> {
        match self.props.get(name)? {
            Property::U32(cells) => cells.first().copied(),
            _ => None,
        }
    }

    fn read_string(&self, name: &str) -> Option<&str> {
        match self.props.get(name)? {
            Property::Strings(list) => list.first().map(String::as_str),
            _ => None,
        }
    }

    fn parse_phandle(&self, name: &str, index: usize) -> Option<Phandle> {
        match self.props.get(name)? {
            Property::Phandles(list) => list.get(index).copied(),
            _ => None,
        }
    }

    fn is_compatible(&self, compatible: &str) -> bool {
        self.compatibles.iter().any(|c| c == compatible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_props() {
        let node = Node::new("clk")
            .compatible("iioproxy-clock")
            .prop_u32("clock-frequency", 1000)
            .prop_str("clock-output-names", "dds0")
            .prop_phandle("iiohwdev", 7);

        assert_eq!(node.read_u32("clock-frequency"), Some(1000));
        assert_eq!(node.read_string("clock-output-names"), Some("dds0"));
        assert_eq!(node.parse_phandle("iiohwdev", 0), Some(Phandle::from(7u32)));
        assert_eq!(node.parse_phandle("iiohwdev", 1), None);
        assert!(node.is_compatible("iioproxy-clock"));
        assert!(!node.is_compatible("iioproxy"));
    }

    #[test]
    fn test_wrong_type_reads_none() {
        let node = Node::new("clk").prop_str("clock-frequency", "fast");
        assert_eq!(node.read_u32("clock-frequency"), None);
        assert_eq!(node.read_u32("clock-accuracy"), None);
    }

    #[test]
    fn test_ids_unique() {
        assert_ne!(Node::new("a").id(), Node::new("a").id());
    }
}
