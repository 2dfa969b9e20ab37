//! Clock registration service.
//!
//! A [`ClockTree`] owns the operation table of every registered clock and
//! dispatches consumer requests into it. Handles are never reused, so a
//! stale handle cannot reach a newer clock.

use alloc::{
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use log::{debug, warn};
use rdif_base::custom_type;
use rdif_clk::{ClkError, ClkFlags, Hardware, Interface};

use crate::NodeId;

custom_type!(#[doc = "Handle of a clock registered in a [`ClockTree`]"], ClkHandle, usize, "clk{}");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClkInitData {
    pub name: String,
    pub parent_name: Option<String>,
    pub flags: ClkFlags,
}

impl ClkInitData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent_name: None,
            flags: ClkFlags::NONE,
        }
    }

    pub fn parent(mut self, parent_name: Option<&str>) -> Self {
        self.parent_name = parent_name.map(ToString::to_string);
        self
    }

    pub fn flags(mut self, flags: ClkFlags) -> Self {
        self.flags = flags;
        self
    }
}

struct ClkCore {
    init: ClkInitData,
    hw: Hardware,
}

/// Longest parent chain walked before giving up on a clock.
const MAX_DEPTH: usize = 64;

#[derive(Default)]
pub struct ClockTree {
    clocks: BTreeMap<ClkHandle, ClkCore>,
    next: usize,
    providers: BTreeMap<NodeId, ClkHandle>,
}

impl ClockTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `hw` and exposes it under `init.name`.
    ///
    /// On failure `hw` is dropped.
    pub fn register(&mut self, init: ClkInitData, hw: Hardware) -> Result<ClkHandle, ClkError> {
        if self.get(&init.name).is_some() {
            return Err(ClkError::Exists(init.name));
        }
        if self.leads_to(init.parent_name.as_deref(), &init.name) {
            return Err(ClkError::ParentLoop(init.name));
        }

        let handle = ClkHandle(self.next);
        self.next += 1;
        debug!("register clock `{}` as {handle:?}", init.name);
        self.clocks.insert(handle, ClkCore { init, hw });
        Ok(handle)
    }

    /// Removes the clock and hands its operation table back to the caller.
    pub fn unregister(&mut self, handle: ClkHandle) -> Option<Hardware> {
        let core = self.clocks.remove(&handle)?;
        debug!("unregister clock `{}`", core.init.name);

        let before = self.providers.len();
        self.providers.retain(|_, h| *h != handle);
        if self.providers.len() != before {
            warn!(
                "clock `{}` unregistered while still advertised as provider",
                core.init.name
            );
        }
        Some(core.hw)
    }

    pub fn get(&self, name: &str) -> Option<ClkHandle> {
        self.clocks
            .iter()
            .find(|(_, c)| c.init.name == name)
            .map(|(h, _)| *h)
    }

    pub fn contains(&self, handle: ClkHandle) -> bool {
        self.clocks.contains_key(&handle)
    }

    pub fn hw(&self, handle: ClkHandle) -> Option<&dyn Interface> {
        self.clocks
            .get(&handle)
            .map(|c| c.hw.as_ref() as &dyn Interface)
    }

    pub fn hw_mut(&mut self, handle: ClkHandle) -> Option<&mut dyn Interface> {
        self.clocks
            .get_mut(&handle)
            .map(|c| c.hw.as_mut() as &mut dyn Interface)
    }

    pub fn get_rate(&self, handle: ClkHandle) -> Result<u64, ClkError> {
        let parent_rate = self.parent_rate(handle)?;
        Ok(self.core(handle)?.hw.recalc_rate(parent_rate))
    }

    pub fn round_rate(&self, handle: ClkHandle, rate: u64) -> Result<u64, ClkError> {
        let mut parent_rate = self.parent_rate(handle)?;
        self.core(handle)?.hw.round_rate(rate, &mut parent_rate)
    }

    pub fn set_rate(&mut self, handle: ClkHandle, rate: u64) -> Result<(), ClkError> {
        let mut parent_rate = self.parent_rate(handle)?;
        let core = self.clocks.get_mut(&handle).ok_or(ClkError::NotFound)?;

        let rounded = core.hw.round_rate(rate, &mut parent_rate)?;
        debug!(
            "set rate of `{}`: requested {rate}, rounded {rounded}",
            core.init.name
        );
        core.hw.set_rate(rounded, parent_rate)
    }

    pub fn get_accuracy(&self, handle: ClkHandle) -> Result<u64, ClkError> {
        self.chain(handle)?
            .iter()
            .rev()
            .try_fold(0, |acc, h| Ok(self.core(*h)?.hw.recalc_accuracy(acc)))
    }

    /// Advertises `handle` as the clock provided by `node`.
    pub fn add_provider(&mut self, node: NodeId, handle: ClkHandle) -> Result<(), ClkError> {
        self.core(handle)?;
        if self.providers.contains_key(&node) {
            return Err(ClkError::ProviderExists);
        }
        self.providers.insert(node, handle);
        Ok(())
    }

    pub fn del_provider(&mut self, node: NodeId) -> Option<ClkHandle> {
        self.providers.remove(&node)
    }

    pub fn provider_get(&self, node: NodeId) -> Option<ClkHandle> {
        self.providers.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    fn core(&self, handle: ClkHandle) -> Result<&ClkCore, ClkError> {
        self.clocks.get(&handle).ok_or(ClkError::NotFound)
    }

    fn parent(&self, core: &ClkCore) -> Option<ClkHandle> {
        core.init.parent_name.as_deref().and_then(|p| self.get(p))
    }

    /// Whether following parents from `parent` reaches `name`.
    fn leads_to<'a>(&'a self, mut parent: Option<&'a str>, name: &str) -> bool {
        for _ in 0..MAX_DEPTH {
            let Some(p) = parent else {
                return false;
            };
            if p == name {
                return true;
            }
            parent = self
                .get(p)
                .and_then(|h| self.clocks.get(&h))
                .and_then(|c| c.init.parent_name.as_deref());
        }
        true
    }

    /// `handle` followed by its registered ancestors, nearest first.
    fn chain(&self, handle: ClkHandle) -> Result<Vec<ClkHandle>, ClkError> {
        let mut chain = Vec::new();
        let mut next = Some(handle);
        while let Some(h) = next {
            let core = self.core(h)?;
            if chain.len() == MAX_DEPTH || chain.contains(&h) {
                return Err(ClkError::ParentLoop(core.init.name.clone()));
            }
            chain.push(h);
            next = self.parent(core);
        }
        Ok(chain)
    }

    /// Rate of the parent of `handle`. Orphans run from a parent rate of zero.
    fn parent_rate(&self, handle: ClkHandle) -> Result<u64, ClkError> {
        self.chain(handle)?
            .iter()
            .skip(1)
            .rev()
            .try_fold(0, |rate, h| Ok(self.core(*h)?.hw.recalc_rate(rate)))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use rdif_base::{DriverGeneric, ErrorBase};

    use super::*;

    struct Divider {
        div: u64,
        rate: u64,
    }

    impl DriverGeneric for Divider {
        fn open(&mut self) -> Result<(), ErrorBase> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), ErrorBase> {
            Ok(())
        }
    }

    impl Interface for Divider {
        fn recalc_rate(&self, parent_rate: u64) -> u64 {
            if self.div == 0 {
                self.rate
            } else {
                parent_rate / self.div
            }
        }

        fn round_rate(&self, rate: u64, _parent_rate: &mut u64) -> Result<u64, ClkError> {
            Ok(rate / 10 * 10)
        }

        fn set_rate(&mut self, rate: u64, _parent_rate: u64) -> Result<(), ClkError> {
            self.rate = rate;
            Ok(())
        }

        fn recalc_accuracy(&self, parent_accuracy: u64) -> u64 {
            parent_accuracy + 5
        }
    }

    fn fixed(rate: u64) -> Hardware {
        Box::new(Divider { div: 0, rate })
    }

    #[test]
    fn test_name_collision() {
        let mut tree = ClockTree::new();
        tree.register(ClkInitData::new("osc"), fixed(1)).unwrap();
        let err = tree.register(ClkInitData::new("osc"), fixed(2)).unwrap_err();
        assert_eq!(err, ClkError::Exists("osc".into()));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_parent_rate_and_accuracy() {
        let mut tree = ClockTree::new();
        let osc = tree.register(ClkInitData::new("osc"), fixed(1000)).unwrap();
        let div = tree
            .register(
                ClkInitData::new("div4").parent(Some("osc")),
                Box::new(Divider { div: 4, rate: 0 }),
            )
            .unwrap();

        assert_eq!(tree.get_rate(div).unwrap(), 250);
        assert_eq!(tree.get_accuracy(div).unwrap(), 10);

        tree.set_rate(osc, 2009).unwrap();
        assert_eq!(tree.get_rate(osc).unwrap(), 2000);
        assert_eq!(tree.get_rate(div).unwrap(), 500);
        assert_eq!(tree.round_rate(osc, 1234).unwrap(), 1230);
    }

    #[test]
    fn test_handles_not_reused() {
        let mut tree = ClockTree::new();
        let a = tree.register(ClkInitData::new("a"), fixed(1)).unwrap();
        assert!(tree.unregister(a).is_some());
        assert!(tree.unregister(a).is_none());

        let b = tree.register(ClkInitData::new("a"), fixed(2)).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.get_rate(a), Err(ClkError::NotFound));
        assert_eq!(tree.get("a"), Some(b));
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut tree = ClockTree::new();
        let err = tree
            .register(ClkInitData::new("a").parent(Some("a")), fixed(1))
            .unwrap_err();
        assert_eq!(err, ClkError::ParentLoop("a".into()));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_parent_loop_rejected() {
        let mut tree = ClockTree::new();
        let b = tree
            .register(
                ClkInitData::new("b").parent(Some("a")),
                Box::new(Divider { div: 2, rate: 0 }),
            )
            .unwrap();
        assert_eq!(tree.get_rate(b).unwrap(), 0);

        let err = tree
            .register(ClkInitData::new("a").parent(Some("b")), fixed(1))
            .unwrap_err();
        assert_eq!(err, ClkError::ParentLoop("a".into()));
        assert_eq!(tree.len(), 1);

        let a = tree.register(ClkInitData::new("a"), fixed(800)).unwrap();
        assert_eq!(tree.get_rate(b).unwrap(), 400);
        assert_eq!(tree.get_accuracy(b).unwrap(), 10);
        assert_eq!(tree.get_accuracy(a).unwrap(), 5);
    }

    #[test]
    fn test_providers() {
        let mut tree = ClockTree::new();
        let node = NodeId::new();
        let a = tree.register(ClkInitData::new("a"), fixed(1)).unwrap();
        let b = tree.register(ClkInitData::new("b"), fixed(1)).unwrap();

        tree.add_provider(node, a).unwrap();
        assert_eq!(tree.add_provider(node, b), Err(ClkError::ProviderExists));
        assert_eq!(tree.provider_get(node), Some(a));

        tree.unregister(a);
        assert_eq!(tree.provider_get(node), None);
        assert_eq!(tree.add_provider(NodeId::new(), a), Err(ClkError::NotFound));
    }
}
