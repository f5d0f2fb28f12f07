//! Side-channel diagnostics. Skips, fallbacks, and resolution statistics are
//! reported here, never embedded inside symbol records.

use serde::{Deserialize, Serialize};

/// Why a file never reached extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Diagnostics accumulated over one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Unreadable or oversized files, skipped without aborting the run.
    pub skipped_files: Vec<SkippedFile>,
    /// Files the classifier could not map; counted in totals, imports-only
    /// scanned.
    pub unknown_language_files: Vec<String>,
    /// Files whose structural parse failed and fell back to pattern rules,
    /// with the extractor's note.
    pub parse_fallbacks: Vec<SkippedFile>,
    pub resolved_edges: usize,
    pub unresolved_edges: usize,
    pub ambiguous_edges: usize,
    /// Package dependency cycles, one entry per strongly connected set of
    /// packages (sorted names).
    pub package_cycles: Vec<Vec<String>>,
}

impl Diagnostics {
    /// One-line run summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "{} skipped, {} unknown-language, {} parse fallbacks, edges {}/{}/{} (resolved/unresolved/ambiguous), {} package cycles",
            self.skipped_files.len(),
            self.unknown_language_files.len(),
            self.parse_fallbacks.len(),
            self.resolved_edges,
            self.unresolved_edges,
            self.ambiguous_edges,
            self.package_cycles.len(),
        )
    }
}
