//! Writers that turn a finished [`FlatProfile`](crate::cpu::FlatProfile)
//! into files. JSON is the only format.

pub mod flat_json;

pub use flat_json::FlatProfileExporter;
