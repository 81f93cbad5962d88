//! # vmscope - Main Entry Point
//!
//! Two subcommands:
//! - **inspect**: dump the header and edge rows of an XY storage snapshot
//! - **flatten**: flatten a JSON call tree and print (or export) the flat profile

// Table output converts counts for display
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::Path;

use vmscope::charts::{SnapshotHeader, StorageConfig, XyStorage};
use vmscope::cli::args::build_filter;
use vmscope::cli::{Args, Command};
use vmscope::cpu::{CallTreeData, SortKey};
use vmscope::domain::{TimeDimension, NO_VALUE};
use vmscope::export::FlatProfileExporter;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            // Help and version requests print to stdout and exit cleanly
            e.print().ok();
            std::process::exit(code);
        }
    };

    std::process::exit(match run(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Inspect { snapshot, rows } => inspect(&snapshot, rows, args.quiet),
        Command::Flatten { tree, include, exclude, sort, ascending, cpu_time, limit, export } => {
            let options = FlattenOptions { sort, ascending, cpu_time, limit, quiet: args.quiet };
            let filter = build_filter(&include, &exclude);
            flatten(&tree, filter, &options, export.as_deref())
        }
    }
}

/// Load a snapshot into a store shaped after its own header and print it.
fn inspect(path: &Path, rows: usize, quiet: bool) -> Result<()> {
    let mut file = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open snapshot {}", path.display()))?,
    );
    let header = SnapshotHeader::read(&mut file).context("Failed to read snapshot header")?;
    file.seek(SeekFrom::Start(0))?;

    if !quiet {
        println!("snapshot: {}", path.display());
        println!("series: {}", header.series_count);
        println!("rows: {}", header.row_count);
    }
    if rows == 0 || header.row_count == 0 {
        return Ok(());
    }

    let storage = XyStorage::new(StorageConfig {
        values_limit: header.row_count,
        buffer_step: header.row_count.min(StorageConfig::default().buffer_step),
    })?;
    let items: Vec<_> =
        (0..header.series_count).map(|i| storage.add_series(format!("series{i}"), 0, 0)).collect();
    storage.load_snapshot(&mut file).context("Failed to load snapshot rows")?;
    info!("Loaded {} rows into a {}-row store", storage.timestamps_count(), storage.values_limit());

    let count = storage.timestamps_count();
    let shown: Vec<usize> = if count <= rows.saturating_mul(2) {
        (0..count).collect()
    } else {
        (0..rows).chain(count - rows..count).collect()
    };

    let mut previous: Option<usize> = None;
    for index in shown {
        if previous.is_some_and(|p| index > p + 1) {
            println!("  ...");
        }
        previous = Some(index);

        let timestamp = storage.timestamp(index).unwrap_or_default();
        let values: Vec<String> = items
            .iter()
            .map(|item| match item.value(index) {
                Some(NO_VALUE) | None => "-".to_string(),
                Some(v) => v.to_string(),
            })
            .collect();
        println!("{index:>8}  {timestamp:>16}  {}", values.join("  "));
    }

    // Anything left after the declared rows is not part of the snapshot
    let mut trailing = Vec::new();
    file.read_to_end(&mut trailing)?;
    if !trailing.is_empty() && !quiet {
        eprintln!("warning: {} trailing bytes after snapshot rows", trailing.len());
    }
    Ok(())
}

struct FlattenOptions {
    sort: SortKey,
    ascending: bool,
    cpu_time: bool,
    limit: usize,
    quiet: bool,
}

fn flatten(
    path: &Path,
    filter: vmscope::cpu::InstrumentationFilter,
    options: &FlattenOptions,
    export: Option<&Path>,
) -> Result<()> {
    let data = CallTreeData::from_file(path)
        .with_context(|| format!("Failed to load call tree {}", path.display()))?;
    info!("Loaded call tree with {} nodes, {} methods", data.node_count(), data.methods.len());

    let published = data.flatten(filter).context("Flattening produced no profile")?;
    let mut profile = (*published).clone();
    profile.sort_by(options.sort, options.ascending);

    let dimension = if options.cpu_time && profile.is_collecting_two_timestamps() {
        TimeDimension::Secondary
    } else {
        if options.cpu_time && !options.quiet {
            eprintln!("warning: call tree has no thread CPU time, showing wall clock");
        }
        TimeDimension::Primary
    };

    if !options.quiet {
        println!(
            "methods: {}  invocations: {}  self time ({dimension}): {} us",
            profile.row_count(),
            profile.total_invocations(),
            profile.whole_graph_net_time(dimension)
        );
    }
    println!("{:<60} {:>14} {:>7} {:>14} {:>10}", "Method", "Self (us)", "%", "Total (us)", "Calls");
    let limit = if options.limit == 0 { usize::MAX } else { options.limit };
    for row in profile.rows().iter().take(limit) {
        println!(
            "{:<60} {:>14} {:>7.1} {:>14} {:>10}",
            row.name,
            row.net_time(dimension),
            profile.percent(row, dimension),
            row.total_time(dimension),
            row.invocations
        );
    }

    if let Some(export_path) = export {
        let file = File::create(export_path)
            .with_context(|| format!("Failed to create {}", export_path.display()))?;
        FlatProfileExporter::new(std::sync::Arc::new(profile))
            .export(BufWriter::new(file))
            .context("Failed to export flat profile")?;
        if !options.quiet {
            println!("saved: {}", export_path.display());
        }
    }
    Ok(())
}
