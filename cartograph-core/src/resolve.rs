//! Dependency/call resolver.
//!
//! Two passes over the whole repository: build the global symbol table
//! (after every file has been normalized — a symbol declared in the last
//! file may be called from the first), then bind each by-name reference.
//! The tie-break is deliberately conservative: an unresolved edge is
//! preferred over a wrong binding, so same-name candidates without a path
//! or scope hint stay ambiguous.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::model::{
    DependencyKind, DetailedDependency, FileInfo, ResolutionStatus, ResolvedTarget, SymbolId,
    SymbolKind,
};

// ── Global symbol table ────────────────────────────────────────────

/// Immutable snapshot of every Function and Type declared in the
/// repository, keyed by bare name. Same-name declarations across files are
/// kept as a list, never collapsed.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, Vec<SymbolId>>,
    file_paths: Vec<String>,
}

impl SymbolTable {
    pub fn build(files: &[FileInfo]) -> Self {
        let mut table = Self {
            by_name: HashMap::new(),
            file_paths: files.iter().map(|f| f.path.clone()).collect(),
        };
        for file in files {
            for func in &file.functions {
                table.insert(&func.name, func.id.clone());
            }
            for ty in &file.types {
                table.insert(&ty.name, ty.id.clone());
                for method in &ty.methods {
                    table.insert(&method.name, method.id.clone());
                }
            }
        }
        info!(
            names = table.by_name.len(),
            files = table.file_paths.len(),
            "Global symbol table built"
        );
        table
    }

    fn insert(&mut self, name: &str, id: SymbolId) {
        self.by_name.entry(name.to_string()).or_default().push(id);
    }

    pub fn candidates(&self, name: &str) -> &[SymbolId] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }
}

// ── Resolution ─────────────────────────────────────────────────────

/// Resolve every call, import, and inheritance reference in place, then
/// compute `referenced_in` from the resolved and ambiguous edges.
pub fn resolve(files: &mut [FileInfo], table: &SymbolTable, diags: &mut Diagnostics) {
    // Pass A: build annotated edges per file from the immutable snapshot.
    let edges: Vec<Vec<DetailedDependency>> = files
        .iter()
        .map(|file| file_edges(file, table))
        .collect();
    for (file, file_edges) in files.iter_mut().zip(edges) {
        for edge in &file_edges {
            match edge.status {
                ResolutionStatus::Resolved => diags.resolved_edges += 1,
                ResolutionStatus::Unresolved => diags.unresolved_edges += 1,
                ResolutionStatus::Ambiguous => diags.ambiguous_edges += 1,
            }
        }
        file.detailed_dependencies = file_edges;
    }

    // Pass B: referenced_in — which files reference each symbol. Ambiguous
    // edges count for every candidate; the binding itself stays open.
    let mut referenced: HashMap<SymbolId, BTreeSet<String>> = HashMap::new();
    for file in files.iter() {
        for edge in &file.detailed_dependencies {
            let targets = edge.target.iter().chain(edge.candidates.iter());
            for target in targets {
                if let ResolvedTarget::Symbol(id) = target {
                    referenced
                        .entry(id.clone())
                        .or_default()
                        .insert(file.path.clone());
                }
            }
        }
    }
    for file in files.iter_mut() {
        for func in &mut file.functions {
            apply_references(&referenced, &func.id, &mut func.referenced_in);
        }
        for ty in &mut file.types {
            apply_references(&referenced, &ty.id, &mut ty.referenced_in);
            for method in &mut ty.methods {
                apply_references(&referenced, &method.id, &mut method.referenced_in);
            }
        }
    }

    info!(
        resolved = diags.resolved_edges,
        unresolved = diags.unresolved_edges,
        ambiguous = diags.ambiguous_edges,
        "Reference resolution complete"
    );
}

fn apply_references(
    referenced: &HashMap<SymbolId, BTreeSet<String>>,
    id: &SymbolId,
    out: &mut Vec<String>,
) {
    if let Some(paths) = referenced.get(id) {
        *out = paths.iter().cloned().collect();
    }
}

fn file_edges(file: &FileInfo, table: &SymbolTable) -> Vec<DetailedDependency> {
    let mut edges = Vec::new();

    for target in &file.dependencies {
        edges.push(resolve_import(file, target, table));
    }

    for func in &file.functions {
        for callee in &func.calls_to {
            edges.push(resolve_call(file, &func.id, callee, table));
        }
    }
    for ty in &file.types {
        for method in &ty.methods {
            for callee in &method.calls_to {
                edges.push(resolve_call(file, &method.id, callee, table));
            }
        }
        for supertype in &ty.supertypes {
            edges.push(resolve_inherits(file, &ty.id, supertype, table));
        }
    }

    edges
}

/// Imports prefer a textual module-path match against a repository file;
/// only when no path matches do they fall back to a bare-name symbol
/// lookup.
fn resolve_import(file: &FileInfo, target: &str, table: &SymbolTable) -> DetailedDependency {
    // Try the full module path first; only fall back to the parent form
    // (the last segment may be an item, not a module) when nothing matched.
    let mut path_matches: Vec<ResolvedTarget> = Vec::new();
    for form in target_forms(target) {
        path_matches = table
            .file_paths
            .iter()
            .filter(|path| path.as_str() != file.path && path_matches_form(&form, path))
            .map(|path| ResolvedTarget::File(path.clone()))
            .collect();
        if !path_matches.is_empty() {
            break;
        }
    }

    let (status, bound, candidates) = match path_matches.len() {
        1 => (
            ResolutionStatus::Resolved,
            path_matches.into_iter().next(),
            Vec::new(),
        ),
        n if n > 1 => (ResolutionStatus::Ambiguous, None, path_matches),
        _ => {
            let name = trailing_segment(target);
            let symbol_candidates: Vec<ResolvedTarget> = table
                .candidates(name)
                .iter()
                .filter(|id| id.file != file.path)
                .cloned()
                .map(ResolvedTarget::Symbol)
                .collect();
            match symbol_candidates.len() {
                0 => (ResolutionStatus::Unresolved, None, Vec::new()),
                1 => (
                    ResolutionStatus::Resolved,
                    symbol_candidates.into_iter().next(),
                    Vec::new(),
                ),
                _ => (ResolutionStatus::Ambiguous, None, symbol_candidates),
            }
        }
    };

    DetailedDependency {
        name: target.to_string(),
        kind: DependencyKind::Import,
        source: None,
        status,
        target: bound,
        candidates,
        fidelity: file.fidelity,
    }
}

/// Calls bind when exactly one declaration carries the name, or when the
/// caller's own file declares it (local scope shadows the repository —
/// this is also what makes recursive calls resolve to themselves).
/// Multiple candidates with no scope hint stay ambiguous.
fn resolve_call(
    file: &FileInfo,
    source: &SymbolId,
    callee: &str,
    table: &SymbolTable,
) -> DetailedDependency {
    let candidates = table.candidates(callee);
    let (status, bound, open) = bind_candidates(candidates, &file.path);

    DetailedDependency {
        name: callee.to_string(),
        kind: DependencyKind::Call,
        source: Some(source.clone()),
        status,
        target: bound,
        candidates: open,
        fidelity: file.fidelity,
    }
}

fn resolve_inherits(
    file: &FileInfo,
    source: &SymbolId,
    supertype: &str,
    table: &SymbolTable,
) -> DetailedDependency {
    let name = trailing_segment(supertype);
    let type_candidates: Vec<SymbolId> = table
        .candidates(name)
        .iter()
        .filter(|id| id.kind == SymbolKind::Type)
        .cloned()
        .collect();
    let (status, bound, open) = bind_candidates(&type_candidates, &file.path);

    DetailedDependency {
        name: supertype.to_string(),
        kind: DependencyKind::Inherits,
        source: Some(source.clone()),
        status,
        target: bound,
        candidates: open,
        fidelity: file.fidelity,
    }
}

fn bind_candidates(
    candidates: &[SymbolId],
    source_file: &str,
) -> (ResolutionStatus, Option<ResolvedTarget>, Vec<ResolvedTarget>) {
    match candidates.len() {
        0 => (ResolutionStatus::Unresolved, None, Vec::new()),
        1 => (
            ResolutionStatus::Resolved,
            Some(ResolvedTarget::Symbol(candidates[0].clone())),
            Vec::new(),
        ),
        _ => {
            let same_file: Vec<&SymbolId> = candidates
                .iter()
                .filter(|id| id.file == source_file)
                .collect();
            if same_file.len() == 1 {
                (
                    ResolutionStatus::Resolved,
                    Some(ResolvedTarget::Symbol(same_file[0].clone())),
                    Vec::new(),
                )
            } else {
                debug!(candidates = candidates.len(), "ambiguous reference left unbound");
                (
                    ResolutionStatus::Ambiguous,
                    None,
                    candidates
                        .iter()
                        .cloned()
                        .map(ResolvedTarget::Symbol)
                        .collect(),
                )
            }
        }
    }
}

// ── Import path matching ───────────────────────────────────────────

fn trailing_segment(reference: &str) -> &str {
    reference
        .rsplit("::")
        .next()
        .and_then(|s| s.rsplit('.').next())
        .and_then(|s| s.rsplit('/').next())
        .unwrap_or(reference)
        .trim()
}

/// Does one normalized target form textually name this file? Handles
/// directory-root files (`__init__.py`, `mod.rs`, `index.ts`) standing in
/// for their directory.
fn path_matches_form(form: &str, file_path: &str) -> bool {
    let stem = strip_extension(file_path);
    let mut file_forms: Vec<&str> = vec![stem];
    for root in ["/__init__", "/mod", "/index"] {
        if let Some(dir) = stem.strip_suffix(root) {
            file_forms.push(dir);
        }
    }

    file_forms
        .iter()
        .any(|f| *f == form || f.ends_with(&format!("/{form}")))
}

/// Does an import target textually name this file, under any of its forms?
/// Handles dotted module paths (`pkg.mod`), crate paths (`crate::store`),
/// and relative file paths (`./router`).
#[cfg(test)]
fn import_matches(target: &str, file_path: &str) -> bool {
    target_forms(target)
        .iter()
        .any(|form| path_matches_form(form, file_path))
}

fn target_forms(target: &str) -> Vec<String> {
    let trimmed = target.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return Vec::new();
    }

    let path_like = trimmed.contains('/') || trimmed.starts_with('.');
    let base = if path_like {
        // Relative path imports: strip leading ./ and ../, drop extension.
        let mut rest = trimmed;
        while let Some(stripped) = rest.strip_prefix("./").or_else(|| rest.strip_prefix("../")) {
            rest = stripped;
        }
        strip_extension(rest).to_string()
    } else {
        // Module paths: crate::store::Store / pkg.mod → slash separated.
        let rest = trimmed
            .strip_prefix("crate::")
            .or_else(|| trimmed.strip_prefix("self::"))
            .unwrap_or(trimmed);
        rest.replace("::", "/").replace('.', "/")
    };

    if base.is_empty() {
        return Vec::new();
    }

    let mut forms = vec![base.clone()];
    // The last segment may be an item, not a module: crate::store::Store.
    if let Some((parent, _)) = base.rsplit_once('/') {
        forms.push(parent.to_string());
    }
    forms
}

fn strip_extension(path: &str) -> &str {
    path.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.contains('/'))
        .map_or(path, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartograph_languages::Fidelity;
    use crate::model::{FunctionInfo, TypeInfo};

    fn function(path: &str, name: &str, line: usize, calls: &[&str]) -> FunctionInfo {
        FunctionInfo {
            name: name.to_string(),
            id: SymbolId::new(path, SymbolKind::Function, name, line),
            file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
            start_line: line,
            length: 2,
            parameters: Vec::new(),
            return_type: None,
            docstring: None,
            calls_to: calls.iter().map(ToString::to_string).collect(),
            referenced_in: Vec::new(),
            confidence: Fidelity::Structural,
        }
    }

    fn file(path: &str, functions: Vec<FunctionInfo>) -> FileInfo {
        FileInfo {
            path: path.to_string(),
            language: "python".to_string(),
            functions,
            types: Vec::new(),
            variables: Vec::new(),
            dependencies: Vec::new(),
            exports: Vec::new(),
            detailed_dependencies: Vec::new(),
            fidelity: Fidelity::Structural,
        }
    }

    fn run_resolve(files: &mut [FileInfo]) -> Diagnostics {
        let mut diags = Diagnostics::default();
        let table = SymbolTable::build(files);
        resolve(files, &table, &mut diags);
        diags
    }

    #[test]
    fn unique_name_binds_across_files() {
        let mut files = vec![
            file("a.py", vec![function("a.py", "helper", 1, &[])]),
            file("b.py", vec![function("b.py", "main", 1, &["helper"])]),
        ];
        let diags = run_resolve(&mut files);

        let edge = &files[1].detailed_dependencies[0];
        assert_eq!(edge.status, ResolutionStatus::Resolved);
        assert_eq!(
            edge.target.as_ref().unwrap().to_string(),
            "a.py::function::helper@1"
        );
        assert_eq!(files[0].functions[0].referenced_in, vec!["b.py"]);
        assert_eq!(diags.resolved_edges, 1);
    }

    #[test]
    fn duplicate_names_without_hint_stay_ambiguous() {
        let mut files = vec![
            file("a.py", vec![function("a.py", "run", 1, &[])]),
            file("b.py", vec![function("b.py", "run", 1, &[])]),
            file("c.py", vec![function("c.py", "main", 1, &["run"])]),
        ];
        let diags = run_resolve(&mut files);

        let edge = &files[2].detailed_dependencies[0];
        assert_eq!(edge.status, ResolutionStatus::Ambiguous);
        assert!(edge.target.is_none());
        assert_eq!(edge.candidates.len(), 2);
        assert_eq!(diags.ambiguous_edges, 1);
        // Both candidates see the ambiguous reference
        assert_eq!(files[0].functions[0].referenced_in, vec!["c.py"]);
        assert_eq!(files[1].functions[0].referenced_in, vec!["c.py"]);
    }

    #[test]
    fn local_declaration_shadows_duplicates_elsewhere() {
        let mut files = vec![
            file("a.py", vec![function("a.py", "run", 1, &[])]),
            file(
                "b.py",
                vec![
                    function("b.py", "run", 1, &[]),
                    function("b.py", "main", 5, &["run"]),
                ],
            ),
        ];
        run_resolve(&mut files);

        let edge = &files[1].detailed_dependencies[0];
        assert_eq!(edge.status, ResolutionStatus::Resolved);
        assert_eq!(
            edge.target.as_ref().unwrap().to_string(),
            "b.py::function::run@1"
        );
    }

    #[test]
    fn recursive_call_resolves_to_itself() {
        let mut files = vec![file(
            "fib.py",
            vec![function("fib.py", "fib", 1, &["fib"])],
        )];
        run_resolve(&mut files);

        let edge = &files[0].detailed_dependencies[0];
        assert_eq!(edge.status, ResolutionStatus::Resolved);
        assert_eq!(
            edge.target.as_ref().unwrap().to_string(),
            "fib.py::function::fib@1"
        );
        assert_eq!(files[0].functions[0].referenced_in, vec!["fib.py"]);
    }

    #[test]
    fn unknown_name_stays_as_unresolved_edge() {
        let mut files = vec![file(
            "a.py",
            vec![function("a.py", "main", 1, &["requests_get"])],
        )];
        let diags = run_resolve(&mut files);

        let edge = &files[0].detailed_dependencies[0];
        assert_eq!(edge.status, ResolutionStatus::Unresolved);
        assert_eq!(edge.name, "requests_get");
        assert_eq!(diags.unresolved_edges, 1);
    }

    #[test]
    fn import_path_match_beats_name_match() {
        let mut helper_file = file("pkg/util.py", vec![function("pkg/util.py", "util", 1, &[])]);
        helper_file.exports.push("util".to_string());
        // "pkg.util" matches the file path, even though a function named
        // `util` also exists.
        let mut importer = file("main.py", Vec::new());
        importer.dependencies.push("pkg.util".to_string());

        let mut files = vec![helper_file, importer];
        run_resolve(&mut files);

        let edge = &files[1].detailed_dependencies[0];
        assert_eq!(edge.kind, DependencyKind::Import);
        assert_eq!(edge.status, ResolutionStatus::Resolved);
        assert_eq!(edge.target.as_ref().unwrap().to_string(), "pkg/util.py");
    }

    #[test]
    fn inherits_edges_bind_to_types_only() {
        let base = TypeInfo {
            name: "Base".to_string(),
            id: SymbolId::new("base.py", SymbolKind::Type, "Base", 1),
            file_name: "base.py".to_string(),
            start_line: 1,
            length: 2,
            supertypes: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            docstring: None,
            referenced_in: Vec::new(),
            confidence: Fidelity::Structural,
        };
        let child = TypeInfo {
            name: "Child".to_string(),
            id: SymbolId::new("child.py", SymbolKind::Type, "Child", 1),
            supertypes: vec!["Base".to_string()],
            ..base.clone()
        };
        let mut base_file = file("base.py", vec![function("base.py", "Base", 10, &[])]);
        base_file.types.push(base);
        let mut child_file = file("child.py", Vec::new());
        child_file.types.push(child);

        let mut files = vec![base_file, child_file];
        run_resolve(&mut files);

        let edge = &files[1].detailed_dependencies[0];
        assert_eq!(edge.kind, DependencyKind::Inherits);
        // The same-named function in base.py is not a candidate.
        assert_eq!(edge.status, ResolutionStatus::Resolved);
        assert_eq!(
            edge.target.as_ref().unwrap().to_string(),
            "base.py::type::Base@1"
        );
    }

    #[test]
    fn no_reference_is_ever_dropped() {
        let mut files = vec![file(
            "a.py",
            vec![function("a.py", "main", 1, &["x", "y", "z"])],
        )];
        files[0].dependencies.push("missing_module".to_string());
        run_resolve(&mut files);

        // 3 calls + 1 import, all retained as edges
        assert_eq!(files[0].detailed_dependencies.len(), 4);
    }

    #[test]
    fn import_matching_handles_module_root_files() {
        assert!(import_matches("pkg", "pkg/__init__.py"));
        assert!(import_matches("store", "src/store/mod.rs"));
        assert!(import_matches("./router", "src/router/index.ts"));
        assert!(import_matches("crate::store::Store", "src/store.rs"));
        assert!(!import_matches("other", "src/store.rs"));
    }
}
