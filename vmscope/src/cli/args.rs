//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cpu::{InstrumentationFilter, SortKey};

#[derive(Parser)]
#[command(
    name = "vmscope",
    about = "Inspect chart snapshots and flatten CPU call trees",
    after_help = "\
EXAMPLES:
    vmscope inspect heap.xys                         Show header and first/last rows
    vmscope flatten tree.json --sort total           Flat profile by inclusive time
    vmscope flatten tree.json --exclude 'java.*'     Fold JDK time into callers
    vmscope flatten tree.json --export flat.json     Also write JSON"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the contents of an XY storage snapshot
    Inspect {
        /// Snapshot file
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        /// Rows to print from each end (0 = header only)
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Flatten a JSON call tree into per-method statistics
    Flatten {
        /// Call-tree file
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        /// Only keep classes matching PATTERN (trailing * = prefix)
        #[arg(long, value_name = "PATTERN", conflicts_with = "exclude")]
        include: Vec<String>,

        /// Fold classes matching PATTERN into their callers
        #[arg(long, value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Column to sort by
        #[arg(long, value_enum, default_value_t = SortKey::Time)]
        sort: SortKey,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,

        /// Show percentages against thread CPU time (needs two timestamps)
        #[arg(long)]
        cpu_time: bool,

        /// Print at most N rows (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,

        /// Export the flat profile as JSON
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
}

/// Build the instrumentation filter from `--include` / `--exclude`.
#[must_use]
pub fn build_filter(include: &[String], exclude: &[String]) -> InstrumentationFilter {
    if !include.is_empty() {
        InstrumentationFilter::inclusive(include)
    } else if !exclude.is_empty() {
        InstrumentationFilter::exclusive(exclude)
    } else {
        InstrumentationFilter::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::FilterKind;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flatten() {
        let args = Args::parse_from(["vmscope", "flatten", "t.json", "--exclude", "java.*", "--sort", "time1"]);
        match args.command {
            Command::Flatten { exclude, sort, .. } => {
                assert_eq!(exclude, vec!["java.*".to_string()]);
                assert_eq!(sort, SortKey::SecondaryTime);
            }
            Command::Inspect { .. } => panic!("expected flatten"),
        }
    }

    #[test]
    fn test_include_and_exclude_conflict() {
        let result =
            Args::try_parse_from(["vmscope", "flatten", "t.json", "--include", "a.*", "--exclude", "b.*"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_filter_kinds() {
        assert_eq!(build_filter(&[], &[]).kind(), FilterKind::None);
        assert_eq!(build_filter(&["a.*".into()], &[]).kind(), FilterKind::Inclusive);
        assert_eq!(build_filter(&[], &["b.*".into()]).kind(), FilterKind::Exclusive);
    }
}
