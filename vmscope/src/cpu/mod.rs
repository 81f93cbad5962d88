//! CPU sampling results: call trees and their flat per-method view
//!
//! - [`cct`]: calling-context tree nodes and the depth-first walker
//! - [`filter`]: class-name include/exclude filter
//! - [`method_info`]: method id to name resolution
//! - [`flattener`]: folds a walked tree into per-method statistics
//! - [`flat_profile`]: the immutable result handed to tables and exporters
//! - [`tree_file`]: JSON call-tree files for offline flattening

pub mod cct;
pub mod filter;
pub mod flat_profile;
pub mod flattener;
pub mod method_info;
pub mod tree_file;

pub use cct::{walk, CctNodeProcessor, MethodNode};
pub use filter::{FilterKind, InstrumentationFilter};
pub use flat_profile::{FlatProfile, FlatRow, SortKey};
pub use flattener::{CctFlattener, FlatProfileSlot};
pub use method_info::{MethodInfo, MethodInfoMapper, MethodTable};
pub use tree_file::CallTreeData;
