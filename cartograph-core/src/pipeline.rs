//! Pipeline orchestrator: discover → classify/extract/normalize (parallel
//! per file) → resolve → assemble.
//!
//! The per-file stage shares no mutable state and runs on the rayon pool
//! with no ordering guarantee; the symbol table build is the single join
//! point, because a symbol declared in the last file may be the target of a
//! call in the first. Cancellation is cooperative at file-loop boundaries:
//! a cancelled run returns an error and serializes nothing, keeping output
//! all-or-nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use cartograph_languages::classify::{classify, Language};
use cartograph_languages::ExtractorRegistry;

use crate::assemble::{assemble, PACKAGE_ROOT_MARKERS};
use crate::config::AnalyzerConfig;
use crate::diagnostics::{Diagnostics, SkippedFile};
use crate::error::{CartographError, Result};
use crate::model::{CodeGraph, FileInfo};
use crate::normalize::normalize;
use crate::resolve::{resolve, SymbolTable};

/// A completed run: the graph plus the side-channel diagnostics.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub graph: CodeGraph,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct GraphPipeline {
    repo_root: PathBuf,
    registry: ExtractorRegistry,
    cancel: Arc<AtomicBool>,
}

enum FileOutcome {
    Parsed {
        file: Box<FileInfo>,
        language: Language,
        notes: Vec<String>,
    },
    Skipped(SkippedFile),
}

impl GraphPipeline {
    pub fn new(repo_root: &Path) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            registry: ExtractorRegistry::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for aborting the run from another thread. The pipeline checks
    /// it between files and between stages.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the full analysis. Only an inaccessible repository root or
    /// cancellation aborts; per-file problems degrade into diagnostics.
    #[instrument(skip_all, name = "code_graph")]
    pub fn run(&self, config: &AnalyzerConfig) -> Result<AnalysisOutcome> {
        let start = Instant::now();

        if !self.repo_root.is_dir() {
            return Err(CartographError::RepoRoot(
                self.repo_root.display().to_string(),
            ));
        }
        let repo_name = self
            .repo_root
            .file_name()
            .map_or_else(|| "repository".to_string(), |n| n.to_string_lossy().to_string());

        let rel_paths = self.discover(config);
        info!(file_count = rel_paths.len(), "Discovery complete");
        self.check_cancelled()?;

        // Per-file stage — embarrassingly parallel, joined by collect().
        let outcomes: Vec<FileOutcome> = rel_paths
            .par_iter()
            .map(|rel| {
                if self.cancel.load(Ordering::Relaxed) {
                    // Drained below; the run discards everything anyway.
                    return FileOutcome::Skipped(SkippedFile {
                        path: rel.clone(),
                        reason: "cancelled".to_string(),
                    });
                }
                self.process_file(rel, config)
            })
            .collect();
        self.check_cancelled()?;

        let mut diags = Diagnostics::default();
        let mut files: Vec<FileInfo> = Vec::with_capacity(outcomes.len());
        let mut language_counts: BTreeMap<Language, usize> = BTreeMap::new();

        for outcome in outcomes {
            match outcome {
                FileOutcome::Parsed {
                    file,
                    language,
                    notes,
                } => {
                    if language == Language::Unknown {
                        diags.unknown_language_files.push(file.path.clone());
                    } else {
                        *language_counts.entry(language).or_insert(0) += 1;
                    }
                    for note in notes {
                        diags.parse_fallbacks.push(SkippedFile {
                            path: file.path.clone(),
                            reason: note,
                        });
                    }
                    files.push(*file);
                }
                FileOutcome::Skipped(skip) => diags.skipped_files.push(skip),
            }
        }

        let primary_language = primary_language(&language_counts);
        info!(
            files = files.len(),
            language = %primary_language,
            "Extraction complete"
        );

        // Barrier passed: every file is normalized, so the global symbol
        // table is a complete immutable snapshot.
        let table = SymbolTable::build(&files);
        resolve(&mut files, &table, &mut diags);
        self.check_cancelled()?;

        let package_roots = package_roots(&rel_paths);
        let graph = assemble(
            &repo_name,
            &primary_language,
            files,
            &package_roots,
            &mut diags,
        );

        info!(
            duration = ?start.elapsed(),
            summary = %diags.summary(),
            "Analysis complete"
        );
        Ok(AnalysisOutcome {
            graph,
            diagnostics: diags,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(CartographError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Walk the repository per the configured include/exclude globs.
    /// Returns sorted, deduplicated repository-relative paths.
    fn discover(&self, config: &AnalyzerConfig) -> Vec<String> {
        let discovery = &config.discovery;
        let mut matched = Vec::new();

        for pattern in &discovery.include_patterns {
            let full_pattern = self.repo_root.join(pattern).to_string_lossy().to_string();
            match glob::glob(&full_pattern) {
                Ok(paths) => {
                    for entry in paths.flatten() {
                        if !entry.is_file()
                            || is_excluded(&entry, &self.repo_root, &discovery.exclude_patterns)
                        {
                            continue;
                        }
                        if let Ok(rel) = entry.strip_prefix(&self.repo_root) {
                            matched.push(rel.to_string_lossy().replace('\\', "/"));
                        }
                    }
                }
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Invalid glob pattern");
                }
            }
        }

        matched.sort();
        matched.dedup();
        matched
    }

    fn process_file(&self, rel: &str, config: &AnalyzerConfig) -> FileOutcome {
        let abs = self.repo_root.join(rel);

        match std::fs::metadata(&abs) {
            Ok(meta) if meta.len() > config.discovery.max_file_bytes => {
                return FileOutcome::Skipped(SkippedFile {
                    path: rel.to_string(),
                    reason: format!(
                        "file size {} exceeds limit {}",
                        meta.len(),
                        config.discovery.max_file_bytes
                    ),
                });
            }
            Err(e) => {
                return FileOutcome::Skipped(SkippedFile {
                    path: rel.to_string(),
                    reason: format!("unreadable: {e}"),
                });
            }
            Ok(_) => {}
        }

        let source = match std::fs::read_to_string(&abs) {
            Ok(source) => source,
            Err(e) => {
                // Permission or encoding failure — skip, never abort.
                debug!(path = rel, error = %e, "Skipping unreadable file");
                return FileOutcome::Skipped(SkippedFile {
                    path: rel.to_string(),
                    reason: format!("unreadable: {e}"),
                });
            }
        };

        let language = classify(Path::new(rel), Some(&source));
        let Some(extractor) = self.registry.for_language(language) else {
            // The registry covers every tag; treat a miss like Unknown.
            let empty = cartograph_languages::Extraction::heuristic(
                cartograph_languages::RawSymbols::default(),
            );
            return FileOutcome::Parsed {
                file: Box::new(normalize(rel, Language::Unknown, empty)),
                language: Language::Unknown,
                notes: Vec::new(),
            };
        };

        let extraction = extractor.extract(&source, Path::new(rel));
        let notes = extraction.notes.clone();
        let file = normalize(rel, language, extraction);

        FileOutcome::Parsed {
            file: Box::new(file),
            language,
            notes,
        }
    }
}

/// Majority language across classified files; ties break on the language
/// name so repeated runs agree. `unknown` when nothing classified.
fn primary_language(counts: &BTreeMap<Language, usize>) -> String {
    counts
        .iter()
        .max_by(|(lang_a, count_a), (lang_b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| lang_b.as_str().cmp(lang_a.as_str()))
        })
        .map_or_else(|| "unknown".to_string(), |(lang, _)| lang.as_str().to_string())
}

/// Directories containing a module-root marker file, from the discovered
/// path list.
fn package_roots(rel_paths: &[String]) -> BTreeSet<String> {
    let mut roots = BTreeSet::new();
    for rel in rel_paths {
        let (dir, name) = match rel.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", rel.as_str()),
        };
        if PACKAGE_ROOT_MARKERS.contains(&name) {
            roots.insert(dir.to_string());
        }
    }
    roots
}

fn is_excluded(path: &Path, repo_root: &Path, exclude_patterns: &[String]) -> bool {
    let relative = path.strip_prefix(repo_root).unwrap_or(path);
    let rel_str = relative.to_string_lossy().replace('\\', "/");

    for pattern in exclude_patterns {
        let normalized = pattern.replace("**", "");
        let normalized = normalized.trim_matches('/');
        if !normalized.is_empty() && rel_str.contains(normalized) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn run(root: &Path) -> AnalysisOutcome {
        GraphPipeline::new(root)
            .run(&AnalyzerConfig::default())
            .unwrap()
    }

    #[test]
    fn inaccessible_root_is_the_only_fatal_error() {
        let result = GraphPipeline::new(Path::new("/no/such/repo")).run(&AnalyzerConfig::default());
        assert!(matches!(result, Err(CartographError::RepoRoot(_))));
    }

    #[test]
    fn helper_main_scenario_resolves_across_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.py", "def helper():\n    pass\n");
        write(tmp.path(), "b.py", "def main():\n    helper()\n");

        let outcome = run(tmp.path());
        let graph = &outcome.graph;
        assert_eq!(graph.language, "python");
        assert_eq!(graph.total_files, 2);
        assert_eq!(graph.total_functions, 2);

        let root = &graph.packages[0];
        let a = root.files.iter().find(|f| f.path == "a.py").unwrap();
        let b = root.files.iter().find(|f| f.path == "b.py").unwrap();

        assert_eq!(a.functions[0].referenced_in, vec!["b.py"]);
        let edge = &b.detailed_dependencies[0];
        assert_eq!(edge.target.as_ref().unwrap().to_string(), "a.py::function::helper@1");
        assert_eq!(outcome.diagnostics.resolved_edges, 1);
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "good.py", "def ok():\n    pass\n");
        std::fs::write(tmp.path().join("bad.py"), [0xff_u8, 0xfe, 0x00, 0x01]).unwrap();

        let outcome = run(tmp.path());
        assert_eq!(outcome.diagnostics.skipped_files.len(), 1);
        assert_eq!(outcome.diagnostics.skipped_files[0].path, "bad.py");
        assert_eq!(outcome.graph.total_files, 1);
    }

    #[test]
    fn unknown_files_count_but_extract_imports_only() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "notes.txt", "import weird.module\nhello\n");
        write(tmp.path(), "main.py", "def go():\n    pass\n");

        let outcome = run(tmp.path());
        assert_eq!(outcome.graph.total_files, 2);
        assert_eq!(outcome.diagnostics.unknown_language_files, vec!["notes.txt"]);

        let root = &outcome.graph.packages[0];
        let notes = root.files.iter().find(|f| f.path == "notes.txt").unwrap();
        assert!(notes.functions.is_empty());
        assert_eq!(notes.dependencies, vec!["weird.module"]);
    }

    #[test]
    fn broken_structural_file_degrades_to_pattern_rules() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "broken.py",
            "def half(x:\n    return x / 2\n\ndef whole():\n    pass\n",
        );

        let outcome = run(tmp.path());
        assert_eq!(outcome.diagnostics.parse_fallbacks.len(), 1);
        let file = &outcome.graph.packages[0].files[0];
        assert_eq!(file.fidelity, cartograph_languages::Fidelity::Heuristic);
        let names: Vec<_> = file.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"half"));
        assert!(names.contains(&"whole"));
    }

    #[test]
    fn cancelled_run_yields_no_partial_graph() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.py", "def f():\n    pass\n");

        let pipeline = GraphPipeline::new(tmp.path());
        pipeline.cancel_flag().store(true, Ordering::Relaxed);
        let result = pipeline.run(&AnalyzerConfig::default());
        assert!(matches!(result, Err(CartographError::Cancelled)));
    }

    #[test]
    fn excluded_directories_never_enter_the_pipeline() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "src/app.py", "def go():\n    pass\n");
        write(tmp.path(), "node_modules/lib/index.js", "function x() {}\n");

        let outcome = run(tmp.path());
        assert_eq!(outcome.graph.total_files, 1);
    }

    #[test]
    fn primary_language_ties_break_deterministically() {
        let mut counts = BTreeMap::new();
        counts.insert(Language::Go, 2);
        counts.insert(Language::Java, 2);
        assert_eq!(primary_language(&counts), "go");
        assert_eq!(primary_language(&BTreeMap::new()), "unknown");
    }
}
