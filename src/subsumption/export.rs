//! DOT export of subsumption graphs for external visualization

use super::SubsumptionGraph;
use crate::error::{Result, RulesetError};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Outcome of exporting a set of buckets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub failed: usize,
}

impl SubsumptionGraph {
    /// Write this graph as DOT to `path`, refusing to overwrite
    pub fn export_dot(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => RulesetError::OutputExists(path.to_path_buf()),
                _ => RulesetError::Export {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            })?;

        file.write_all(self.to_dot().as_bytes())
            .map_err(|e| RulesetError::Export {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Export every bucket and its densest subtree into `dir`
///
/// Files are named `<stem>.dot` and `biggest_<stem>.dot`, e.g. `le_5.dot`.
/// A failing file is logged and counted; the remaining files are still
/// attempted.
pub fn export_buckets(buckets: &[SubsumptionGraph], dir: &Path) -> ExportSummary {
    let mut summary = ExportSummary::default();

    if let Err(e) = fs::create_dir_all(dir) {
        tracing::warn!("Cannot create graph folder {}: {}", dir.display(), e);
        summary.failed = buckets.len();
        return summary;
    }

    for graph in buckets {
        let stem = graph.key().file_stem();

        let path = dir.join(format!("{}.dot", stem));
        record(&mut summary, path.clone(), graph.export_dot(&path));

        match graph.densest_subtree() {
            Some(subtree) => {
                let path = dir.join(format!("biggest_{}.dot", stem));
                record(&mut summary, path.clone(), subtree.export_dot(&path));
            }
            None => tracing::debug!(bucket = %graph.key(), "no edges, densest subtree skipped"),
        }
    }

    tracing::info!(
        "Exported {} graph files to {} ({} failed)",
        summary.written.len(),
        dir.display(),
        summary.failed
    );
    summary
}

fn record(summary: &mut ExportSummary, path: PathBuf, result: Result<()>) {
    match result {
        Ok(()) => summary.written.push(path),
        Err(e) => {
            tracing::warn!("Graph export failed: {}", e);
            summary.failed += 1;
        }
    }
}
