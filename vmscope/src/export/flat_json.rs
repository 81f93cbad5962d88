use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

use crate::cpu::FlatProfile;
use crate::domain::{ExportError, MethodId, TimeDimension};

/// One method row in the exported document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedMethod {
    method_id: MethodId,
    name: String,
    /// Self time, wall clock, microseconds
    net_time0: i64,
    /// Self time, thread CPU, microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    net_time1: Option<i64>,
    total_time0: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_time1: Option<i64>,
    invocations: u32,
    /// Share of whole-graph primary self time
    percent: f64,
}

/// Exported document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedProfile {
    two_timestamps: bool,
    whole_graph_net_time0: i64,
    whole_graph_net_time1: i64,
    total_invocations: u64,
    methods: Vec<ExportedMethod>,
}

/// JSON exporter for flat profiles
pub struct FlatProfileExporter {
    profile: Arc<FlatProfile>,
    pretty: bool,
}

impl FlatProfileExporter {
    /// Create a new exporter for a published profile
    pub fn new(profile: Arc<FlatProfile>) -> Self {
        Self { profile, pretty: true }
    }

    /// Emit compact JSON instead of indented JSON
    #[must_use]
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    fn document(&self) -> ExportedProfile {
        let profile = &self.profile;
        let methods = profile
            .rows()
            .iter()
            .map(|row| ExportedMethod {
                method_id: row.method_id,
                name: row.name.clone(),
                net_time0: row.net_time0,
                net_time1: row.net_time1,
                total_time0: row.total_time0,
                total_time1: row.total_time1,
                invocations: row.invocations,
                percent: profile.percent(row, TimeDimension::Primary),
            })
            .collect();

        ExportedProfile {
            two_timestamps: profile.is_collecting_two_timestamps(),
            whole_graph_net_time0: profile.whole_graph_net_time(TimeDimension::Primary),
            whole_graph_net_time1: profile.whole_graph_net_time(TimeDimension::Secondary),
            total_invocations: profile.total_invocations(),
            methods,
        }
    }

    /// Export the profile, rows in their current order
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        let document = self.document();
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &document)?;
        } else {
            serde_json::to_writer(&mut writer, &document)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{CallTreeData, InstrumentationFilter};

    #[test]
    fn test_export_shape() {
        let json = r#"{"methods": [{"class": "Thread", "method": "main"}, {"class": "A", "method": "b"}],
                       "root": {"method": 0, "calls": 1, "children": [{"method": 1, "calls": 3, "netTime0": 2000}]}}"#;
        let data = CallTreeData::from_reader(json.as_bytes()).unwrap();
        let profile = data.flatten(InstrumentationFilter::none()).unwrap();

        let mut buffer = Vec::new();
        FlatProfileExporter::new(profile).compact().export(&mut buffer).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(parsed["twoTimestamps"], false);
        assert_eq!(parsed["wholeGraphNetTime0"], 2);
        assert_eq!(parsed["totalInvocations"], 3);
        assert_eq!(parsed["methods"][0]["methodId"], 1);
        assert_eq!(parsed["methods"][0]["name"], "A.b()");
        assert_eq!(parsed["methods"][0]["percent"], 100.0);
        assert!(parsed["methods"][0].get("netTime1").is_none());
    }
}
