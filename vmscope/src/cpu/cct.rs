//! Calling-context tree model and depth-first walker.
//!
//! A sampling run produces one tree per thread. The root carries the reserved
//! thread-root method id; every other node is one calling context of a method
//! with its call count and self ("net") time. Processors receive the tree as
//! a strictly bracketed event stream:
//!
//! ```text
//! on_start
//!   on_node(root)
//!     on_node(a)  on_node(b)  on_backout(b)  on_backout(a)
//!   on_backout(root)
//! on_stop
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{MethodId, THREAD_ROOT_METHOD_ID};

/// One calling context in the tree. Times are nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodNode {
    #[serde(rename = "method")]
    pub method_id: MethodId,

    #[serde(rename = "calls", default)]
    pub n_calls: u32,

    /// Self time, wall clock. May be slightly negative after calibration.
    #[serde(default)]
    pub net_time0: i64,

    /// Self time, thread CPU (only meaningful with two timestamps).
    #[serde(default)]
    pub net_time1: i64,

    /// Inclusive time, wall clock.
    #[serde(default)]
    pub total_time0: i64,

    /// Inclusive time, thread CPU.
    #[serde(default)]
    pub total_time1: i64,

    /// Excluded upstream by root/marker method rules.
    #[serde(default)]
    pub filtered: bool,

    #[serde(default)]
    pub children: Vec<MethodNode>,
}

impl MethodNode {
    /// Thread root with the given children.
    #[must_use]
    pub fn thread_root(children: Vec<MethodNode>) -> Self {
        Self { method_id: THREAD_ROOT_METHOD_ID, n_calls: 1, children, ..Self::default() }
    }

    /// Leaf-style node with a call count and wall-clock self time.
    #[must_use]
    pub fn method(method_id: MethodId, n_calls: u32, net_time0: i64) -> Self {
        Self { method_id, n_calls, net_time0, total_time0: net_time0, ..Self::default() }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<MethodNode>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn filtered(mut self) -> Self {
        self.filtered = true;
        self
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.method_id.is_thread_root()
    }

    /// Highest method id anywhere in this subtree.
    #[must_use]
    pub fn max_method_id(&self) -> MethodId {
        let mut max = self.method_id;
        let mut pending: Vec<&MethodNode> = self.children.iter().collect();
        while let Some(node) = pending.pop() {
            max = max.max(node.method_id);
            pending.extend(node.children.iter());
        }
        max
    }
}

/// Receiver of the bracketed node stream produced by [`walk`].
pub trait CctNodeProcessor {
    fn on_start(&mut self) {}

    fn on_node(&mut self, node: &MethodNode);

    fn on_backout(&mut self, node: &MethodNode);

    fn on_stop(&mut self) {}
}

/// Walk `root` depth-first, feeding every processor in order.
///
/// Iterative, so deep recursive call chains cannot overflow the stack.
pub fn walk(root: &MethodNode, processors: &mut [&mut dyn CctNodeProcessor]) {
    for p in processors.iter_mut() {
        p.on_start();
    }

    // (node, index of the next child to visit)
    let mut stack: Vec<(&MethodNode, usize)> = vec![(root, 0)];
    for p in processors.iter_mut() {
        p.on_node(root);
    }

    while let Some(top) = stack.last_mut() {
        let node: &MethodNode = top.0;
        if let Some(child) = node.children.get(top.1) {
            top.1 += 1;
            for p in processors.iter_mut() {
                p.on_node(child);
            }
            stack.push((child, 0));
        } else {
            stack.pop();
            for p in processors.iter_mut() {
                p.on_backout(node);
            }
        }
    }

    for p in processors.iter_mut() {
        p.on_stop();
    }
}
