//! # vmscope - Chart Series Storage and CPU Profile Flattening
//!
//! vmscope holds the data engines that sit underneath a JVM monitoring UI: the
//! bounded time-series store that feeds the live charts, and the flattener
//! that turns a sampled call tree into the per-method table of a CPU view.
//! Both are plain libraries; rendering and user interaction are left to the
//! consumers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │   Chart driver (timer)   │        │  Sampler / call-tree walker  │
//! └────────────┬─────────────┘        └──────────────┬───────────────┘
//!              │ append(ts, values)                  │ on_start / on_node /
//!              ▼                                     ▼ on_backout / on_stop
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │        XyStorage         │        │         CctFlattener         │
//! │  ring of rows, N series  │        │  per-method accumulators     │
//! │  grow by step, overwrite │        │  filter + reattribution      │
//! └──────┬─────────────┬─────┘        └──────────────┬───────────────┘
//!        │ save/load   │ value(i)                    │ publish (one lock)
//!        ▼             ▼                             ▼
//!   snapshot file   chart painters          FlatProfile ──► table / export
//! ```
//!
//! ## Module Structure
//!
//! - [`charts`]: [`charts::XyStorage`] ring store and its binary snapshot codec
//! - [`cpu`]: call-tree model, walker, instrumentation filter, method mapper,
//!   flattener and the [`cpu::FlatProfile`] container
//! - [`export`]: JSON export of flat profiles
//! - [`cli`]: command-line argument parsing for the `vmscope` binary
//! - [`domain`]: identifier types and error enums
//!
//! ## Typical Usage
//!
//! ```bash
//! # Look into a saved chart snapshot
//! vmscope inspect heap.xys --rows 10
//!
//! # Flatten a recorded call tree, folding JDK frames into their callers
//! vmscope flatten tree.json --exclude 'java.*' --export flat.json
//! ```

// Expose modules for testing
pub mod charts;
pub mod cli;
pub mod cpu;
pub mod domain;
pub mod export;
