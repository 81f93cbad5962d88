//! Call-tree files for offline flattening
//!
//! A recorded sampling run is stored as JSON:
//!
//! ```json
//! {
//!   "twoTimestamps": false,
//!   "methods": [ { "class": "Thread", "method": "main", "signature": "" } ],
//!   "root": { "method": 0, "calls": 1, "children": [] }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cct::{walk, MethodNode};
use super::filter::InstrumentationFilter;
use super::flat_profile::FlatProfile;
use super::flattener::CctFlattener;
use super::method_info::MethodTable;
use crate::domain::{MethodId, TreeError};

/// One thread's call tree together with its method table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTreeData {
    #[serde(default)]
    pub two_timestamps: bool,
    pub methods: MethodTable,
    pub root: MethodNode,
}

impl CallTreeData {
    /// Parse and validate a call-tree file.
    ///
    /// # Errors
    /// - [`TreeError::Io`] if the file cannot be read
    /// - [`TreeError::Json`] if it is not valid JSON for this layout
    /// - [`TreeError::UnknownMethod`] if a node uses an id outside the table
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse and validate call-tree JSON from any reader.
    ///
    /// # Errors
    /// See [`CallTreeData::from_file`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TreeError> {
        let data: CallTreeData = serde_json::from_reader(reader)?;
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<(), TreeError> {
        if self.methods.is_empty() {
            return Err(TreeError::TreeParseFailed("method table is empty".to_string()));
        }
        if !self.root.is_root() {
            return Err(TreeError::TreeParseFailed(format!(
                "root node must be the thread root, found {}",
                self.root.method_id
            )));
        }
        let max = self.root.max_method_id();
        if max.slot() >= self.methods.len() {
            return Err(TreeError::UnknownMethod(max));
        }
        Ok(())
    }

    /// Flatten the tree with `filter` applied during the walk.
    #[must_use]
    pub fn flatten(&self, filter: InstrumentationFilter) -> Option<Arc<FlatProfile>> {
        let mut flattener = CctFlattener::new(Arc::new(self.methods.clone()), filter, self.two_timestamps);
        walk(&self.root, &mut [&mut flattener]);
        flattener.current()
    }

    /// Number of nodes in the tree, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    /// Method ids are dense, so the highest id tells how many are in use.
    #[must_use]
    pub fn max_method_id(&self) -> MethodId {
        self.root.max_method_id()
    }
}
