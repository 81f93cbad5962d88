//! Call-tree flattening into per-method statistics.
//!
//! The flattener is a [`CctNodeProcessor`]: it sees every node of a sampling
//! run once on the way down (`on_node`) and once on the way up
//! (`on_backout`), and folds each node into a per-method accumulator slot.
//!
//! # Filtering
//!
//! A node is hidden if it was excluded upstream (root/marker rules), if its
//! id lies outside the mapper's method table, or if its class fails the
//! current [`InstrumentationFilter`]. A hidden node's calls
//! and self time go to the nearest visible ancestor instead:
//!
//! ```text
//!   A ──► B (hidden) ──► C          A.net += A + B
//!                                   C.net += C
//! ```
//!
//! Hidden nodes directly under the thread root have no visible ancestor and
//! their time is not attributed anywhere.
//!
//! # Threading
//!
//! Accumulators belong to whoever drives the walk (`&mut self`). Finished
//! profiles go through a [`FlatProfileSlot`], which any thread may hold and
//! read; the slot swaps the whole profile under one lock.

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};

use super::cct::{CctNodeProcessor, MethodNode};
use super::filter::InstrumentationFilter;
use super::flat_profile::{FlatProfile, FlatRow};
use super::method_info::MethodInfoMapper;
use crate::domain::{MethodId, TimeDimension};
use vmscope_common::NANOS_PER_MICRO;

/// Per-method accumulators, reused across runs.
#[derive(Debug, Default)]
struct Accumulators {
    net_time0: Vec<i64>,
    net_time1: Vec<i64>,
    total_time0: Vec<i64>,
    total_time1: Vec<i64>,
    invocations: Vec<u32>,
    /// Calls made from each method to its visible callees.
    callee_invocations: Vec<u32>,
    /// Activations currently open per method, to count recursion once.
    on_stack: Vec<u32>,
}

impl Accumulators {
    /// Zero every slot and size the arena to `n_methods`, keeping capacity.
    fn reset(&mut self, n_methods: usize) {
        for column in [&mut self.net_time0, &mut self.net_time1, &mut self.total_time0, &mut self.total_time1] {
            column.clear();
            column.resize(n_methods, 0);
        }
        for column in [&mut self.invocations, &mut self.callee_invocations, &mut self.on_stack] {
            column.clear();
            column.resize(n_methods, 0);
        }
    }

    fn len(&self) -> usize {
        self.invocations.len()
    }
}

/// Entry of the parent stack, one per node currently open.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Nearest visible ancestor for the node's children (itself if visible).
    parent: Option<MethodId>,
    /// Method whose `on_stack` count this node raised, if visible.
    entered: Option<MethodId>,
}

/// Shared handle to the most recently published flat profile.
#[derive(Debug, Clone, Default)]
pub struct FlatProfileSlot {
    inner: Arc<Mutex<Option<Arc<FlatProfile>>>>,
}

impl FlatProfileSlot {
    /// Latest profile, or `None` before the first run finished.
    #[must_use]
    pub fn current(&self) -> Option<Arc<FlatProfile>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn publish(&self, profile: FlatProfile) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(profile));
    }
}

/// Collapses a call-tree node stream into a [`FlatProfile`].
pub struct CctFlattener {
    mapper: Arc<dyn MethodInfoMapper>,
    filter: InstrumentationFilter,
    two_timestamps: bool,
    acc: Accumulators,
    parent_stack: Vec<Frame>,
    running: bool,
    slot: FlatProfileSlot,
}

impl CctFlattener {
    /// `two_timestamps` also collects thread-CPU time next to wall-clock time.
    pub fn new(mapper: Arc<dyn MethodInfoMapper>, filter: InstrumentationFilter, two_timestamps: bool) -> Self {
        Self {
            mapper,
            filter,
            two_timestamps,
            acc: Accumulators::default(),
            parent_stack: Vec::new(),
            running: false,
            slot: FlatProfileSlot::default(),
        }
    }

    /// Filter used from the next visited node on.
    pub fn set_filter(&mut self, filter: InstrumentationFilter) {
        self.filter = filter;
    }

    #[must_use]
    pub fn filter(&self) -> &InstrumentationFilter {
        &self.filter
    }

    #[must_use]
    pub fn is_collecting_two_timestamps(&self) -> bool {
        self.two_timestamps
    }

    /// Reader handle for other threads.
    #[must_use]
    pub fn slot(&self) -> FlatProfileSlot {
        self.slot.clone()
    }

    /// Latest published profile.
    #[must_use]
    pub fn current(&self) -> Option<Arc<FlatProfile>> {
        self.slot.current()
    }

    fn is_hidden(&self, node: &MethodNode) -> bool {
        if node.is_root() {
            return false;
        }
        if node.filtered {
            return true;
        }
        // Ids past the mapper's table have no slot and no class to match
        if node.method_id.slot() >= self.acc.len() {
            return true;
        }
        self.mapper.class_name(node.method_id).is_some_and(|class| !self.filter.passes(class))
    }

    fn finalize(&self) -> FlatProfile {
        let mut whole0 = 0i64;
        let mut whole1 = 0i64;
        let mut rows = Vec::new();

        for slot in 0..self.acc.len() {
            let net0 = to_micros(self.acc.net_time0[slot]);
            let net1 = to_micros(self.acc.net_time1[slot]);
            let Ok(id) = u32::try_from(slot) else { break };
            let method = MethodId(id);
            if method.is_thread_root() {
                continue;
            }

            whole0 = whole0.wrapping_add(net0);
            if self.two_timestamps {
                whole1 = whole1.wrapping_add(net1);
            }

            let invocations = self.acc.invocations[slot];
            if invocations == 0 {
                continue;
            }
            rows.push(FlatRow {
                method_id: method,
                name: self.mapper.display_name(method),
                class_name: self.mapper.class_name(method).unwrap_or_default().to_string(),
                net_time0: net0,
                net_time1: self.two_timestamps.then_some(net1),
                total_time0: to_micros(self.acc.total_time0[slot]),
                total_time1: self.two_timestamps.then(|| to_micros(self.acc.total_time1[slot])),
                invocations,
            });
        }

        FlatProfile::new(rows, self.two_timestamps, whole0, whole1)
    }
}

/// Nanoseconds to microseconds, truncating; calibration residue below zero
/// becomes zero.
fn to_micros(nanos: i64) -> i64 {
    (nanos / NANOS_PER_MICRO).max(0)
}

impl CctNodeProcessor for CctFlattener {
    fn on_start(&mut self) {
        self.acc.reset(self.mapper.method_count());
        self.parent_stack.clear();
        self.running = true;
    }

    fn on_node(&mut self, node: &MethodNode) {
        if !self.running {
            warn!("Ignoring {} visited outside of a flattening run", node.method_id);
            return;
        }

        let current_parent = self.parent_stack.last().and_then(|f| f.parent);
        let attributable = current_parent.filter(|p| !p.is_thread_root());
        let method = node.method_id;

        let frame = if self.is_hidden(node) {
            if method.slot() >= self.acc.len() {
                warn!("Hiding {method}: outside the method table of {} entries", self.acc.len());
            }
            if let Some(parent) = attributable {
                let p = parent.slot();
                self.acc.invocations[p] = self.acc.invocations[p].wrapping_add(node.n_calls);
                self.acc.net_time0[p] = self.acc.net_time0[p].wrapping_add(node.net_time0);
                if self.two_timestamps {
                    self.acc.net_time1[p] = self.acc.net_time1[p].wrapping_add(node.net_time1);
                }
            }
            Frame { parent: current_parent, entered: None }
        } else {
            let m = method.slot();
            self.acc.net_time0[m] = self.acc.net_time0[m].wrapping_add(node.net_time0);
            if self.two_timestamps {
                self.acc.net_time1[m] = self.acc.net_time1[m].wrapping_add(node.net_time1);
            }
            self.acc.invocations[m] = self.acc.invocations[m].wrapping_add(node.n_calls);

            if let Some(parent) = attributable {
                let p = parent.slot();
                self.acc.callee_invocations[p] = self.acc.callee_invocations[p].wrapping_add(node.n_calls);
            }

            // Inclusive time of a recursive method is already in its outer activation
            if self.acc.on_stack[m] == 0 {
                self.acc.total_time0[m] = self.acc.total_time0[m].wrapping_add(node.total_time0);
                if self.two_timestamps {
                    self.acc.total_time1[m] = self.acc.total_time1[m].wrapping_add(node.total_time1);
                }
            }
            self.acc.on_stack[m] += 1;

            Frame { parent: Some(method), entered: Some(method) }
        };

        self.parent_stack.push(frame);
    }

    fn on_backout(&mut self, node: &MethodNode) {
        let Some(frame) = self.parent_stack.pop() else {
            warn!("Unbalanced backout of {}: no open node", node.method_id);
            return;
        };
        if let Some(method) = frame.entered {
            let count = &mut self.acc.on_stack[method.slot()];
            *count = count.saturating_sub(1);
        }
    }

    fn on_stop(&mut self) {
        if !self.running {
            warn!("Flattening stopped without being started");
            return;
        }
        if !self.parent_stack.is_empty() {
            warn!("Flattening stopped with {} unclosed nodes", self.parent_stack.len());
            self.parent_stack.clear();
        }
        self.running = false;

        let profile = self.finalize();
        debug!(
            "Flattened {} methods, whole graph {} us",
            profile.row_count(),
            profile.whole_graph_net_time(TimeDimension::Primary)
        );
        self.slot.publish(profile);
    }
}
