//! Method and series identifiers plus the wall/CPU time dimension
//!
//! The identifier newtypes live in `vmscope-common` so that readers of the
//! snapshot and export formats can share them; they are re-exported here.

use std::fmt;

pub use vmscope_common::{MethodId, SeriesIndex, NO_VALUE, THREAD_ROOT_METHOD_ID};

/// Which of the two time measurements a flat-profile value refers to.
///
/// Primary is wall-clock time. Secondary is thread CPU time and is only
/// collected when the flattener was built with two timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeDimension {
    #[default]
    Primary,
    Secondary,
}

impl fmt::Display for TimeDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeDimension::Primary => write!(f, "wall"),
            TimeDimension::Secondary => write!(f, "cpu"),
        }
    }
}
