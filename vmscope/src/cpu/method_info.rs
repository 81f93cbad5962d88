//! Method id to name resolution.

use serde::{Deserialize, Serialize};

use crate::domain::MethodId;

/// Resolves dense method ids to class, method and signature names.
///
/// Injected into the flattener once; implementations must be cheap to query
/// because the filter consults the class name of every visited node.
pub trait MethodInfoMapper: Send + Sync {
    /// Class name in dotted or slashed form.
    fn class_name(&self, method: MethodId) -> Option<&str>;

    fn method_name(&self, method: MethodId) -> Option<&str>;

    fn signature(&self, method: MethodId) -> Option<&str>;

    /// Number of known method ids (ids are `0..method_count`).
    fn method_count(&self) -> usize;

    /// `pkg.Class.method(signature)` for table display.
    fn display_name(&self, method: MethodId) -> String {
        let Some(class) = self.class_name(method) else {
            return format!("<unknown {method}>");
        };
        let class = class.replace('/', ".");
        let name = self.method_name(method).unwrap_or("<unknown>");
        match self.signature(method) {
            Some(sig) if sig.starts_with('(') => format!("{class}.{name}{sig}"),
            Some(sig) if !sig.is_empty() => format!("{class}.{name}({sig})"),
            _ => format!("{class}.{name}()"),
        }
    }
}

/// Names of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "method")]
    pub method_name: String,
    #[serde(default)]
    pub signature: String,
}

impl MethodInfo {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self { class_name: class_name.into(), method_name: method_name.into(), signature: signature.into() }
    }
}

/// Table-backed mapper: method id `n` is entry `n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodTable {
    methods: Vec<MethodInfo>,
}

impl MethodTable {
    #[must_use]
    pub fn new(methods: Vec<MethodInfo>) -> Self {
        Self { methods }
    }

    /// Append a method and return its id.
    pub fn push(&mut self, info: MethodInfo) -> MethodId {
        let id = MethodId(u32::try_from(self.methods.len()).unwrap_or(u32::MAX));
        self.methods.push(info);
        id
    }

    #[must_use]
    pub fn get(&self, method: MethodId) -> Option<&MethodInfo> {
        self.methods.get(method.slot())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl MethodInfoMapper for MethodTable {
    fn class_name(&self, method: MethodId) -> Option<&str> {
        self.get(method).map(|m| m.class_name.as_str())
    }

    fn method_name(&self, method: MethodId) -> Option<&str> {
        self.get(method).map(|m| m.method_name.as_str())
    }

    fn signature(&self, method: MethodId) -> Option<&str> {
        self.get(method).map(|m| m.signature.as_str())
    }

    fn method_count(&self) -> usize {
        self.methods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_formats() {
        let mut table = MethodTable::default();
        let a = table.push(MethodInfo::new("com/acme/App", "main", "([Ljava/lang/String;)V"));
        let b = table.push(MethodInfo::new("com.acme.App", "run", ""));
        let c = table.push(MethodInfo::new("com.acme.App", "work", "int"));

        assert_eq!(table.display_name(a), "com.acme.App.main([Ljava/lang/String;)V");
        assert_eq!(table.display_name(b), "com.acme.App.run()");
        assert_eq!(table.display_name(c), "com.acme.App.work(int)");
        assert_eq!(table.display_name(MethodId(99)), "<unknown method#99>");
    }

    #[test]
    fn test_table_deserializes_from_array() {
        let table: MethodTable =
            serde_json::from_str(r#"[{"class": "Thread", "method": "main"}, {"class": "A", "method": "b", "signature": "()V"}]"#)
                .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.signature(MethodId(0)), Some(""));
        assert_eq!(table.class_name(MethodId(1)), Some("A"));
    }
}
