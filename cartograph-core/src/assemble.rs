//! Package assembler: buckets files into packages, aggregates file-level
//! edges into package-level edges, and computes repository totals.
//!
//! Package dependency edges may form cycles; the assembler detects and
//! flags them in diagnostics but never rejects a cyclic graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use tracing::info;

use crate::diagnostics::Diagnostics;
use crate::model::{CodeGraph, FileInfo, PackageEdge, PackageInfo, ResolutionStatus};

/// Marker files whose directory roots a package.
pub const PACKAGE_ROOT_MARKERS: &[&str] = &[
    "Cargo.toml",
    "package.json",
    "go.mod",
    "pyproject.toml",
    "__init__.py",
];

/// Assemble normalized, resolved files into the final graph.
///
/// `package_roots` holds repository-relative directories containing a
/// module-root marker (`""` for the repository root). A file belongs to the
/// deepest root above it; files under no root fall back to their directory
/// path, dotted.
pub fn assemble(
    repo_name: &str,
    primary_language: &str,
    files: Vec<FileInfo>,
    package_roots: &BTreeSet<String>,
    diags: &mut Diagnostics,
) -> CodeGraph {
    let total_files = files.len();

    // Bucket files; BTreeMap gives lexical package order.
    let mut buckets: BTreeMap<String, Vec<FileInfo>> = BTreeMap::new();
    for file in files {
        let package = package_name(&file.path, package_roots);
        buckets.entry(package).or_default().push(file);
    }

    let mut file_packages: HashMap<String, String> = HashMap::new();
    for (package, members) in &buckets {
        for file in members {
            file_packages.insert(file.path.clone(), package.clone());
        }
    }

    let mut total_functions = 0;
    let mut total_classes = 0;
    let mut total_variables = 0;
    let mut packages = Vec::with_capacity(buckets.len());

    for (name, mut members) in buckets {
        members.sort_by(|a, b| a.path.cmp(&b.path));

        let mut dependencies = BTreeSet::new();
        let mut exports = BTreeSet::new();
        let mut edges = BTreeSet::new();

        for file in &members {
            total_functions += file.functions.len()
                + file.types.iter().map(|t| t.methods.len()).sum::<usize>();
            total_classes += file.types.len();
            total_variables += file.variables.len();

            dependencies.extend(file.dependencies.iter().cloned());
            exports.extend(file.exports.iter().cloned());

            for edge in &file.detailed_dependencies {
                if edge.status != ResolutionStatus::Resolved {
                    continue;
                }
                let Some(target) = &edge.target else { continue };
                let Some(target_package) = file_packages.get(target.file()) else {
                    continue;
                };
                if *target_package != name {
                    edges.insert(PackageEdge {
                        target: target_package.clone(),
                        kind: edge.kind,
                    });
                }
            }
        }

        packages.push(PackageInfo {
            name,
            files: members,
            dependencies: dependencies.into_iter().collect(),
            exports: exports.into_iter().collect(),
            edges: edges.into_iter().collect(),
        });
    }

    detect_cycles(&packages, diags);

    info!(
        packages = packages.len(),
        files = total_files,
        functions = total_functions,
        classes = total_classes,
        "Package assembly complete"
    );

    CodeGraph {
        name: repo_name.to_string(),
        packages,
        language: primary_language.to_string(),
        total_files,
        total_functions,
        total_classes,
        total_variables,
    }
}

fn package_name(file_path: &str, package_roots: &BTreeSet<String>) -> String {
    let dir = match file_path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };

    // Deepest marker root above the file wins.
    let best_root = package_roots
        .iter()
        .filter(|root| {
            root.is_empty() || dir == root.as_str() || dir.starts_with(&format!("{root}/"))
        })
        .max_by_key(|root| root.len());

    if let Some(root) = best_root {
        return if root.is_empty() {
            dotted_or_root(dir)
        } else {
            root.replace('/', ".")
        };
    }

    dotted_or_root(dir)
}

/// Top-level files group under `"root"`; everything else under the dotted
/// directory path.
fn dotted_or_root(dir: &str) -> String {
    if dir.is_empty() {
        "root".to_string()
    } else {
        dir.replace('/', ".")
    }
}

fn detect_cycles(packages: &[PackageInfo], diags: &mut Diagnostics) {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices = HashMap::new();
    for package in packages {
        indices.insert(package.name.as_str(), graph.add_node(package.name.as_str()));
    }
    for package in packages {
        let source = indices[package.name.as_str()];
        for edge in &package.edges {
            if let Some(&target) = indices.get(edge.target.as_str()) {
                graph.update_edge(source, target, ());
            }
        }
    }

    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let mut names: Vec<String> =
                scc.iter().map(|&idx| graph[idx].to_string()).collect();
            names.sort();
            diags.package_cycles.push(names);
        }
    }
    diags.package_cycles.sort();
}
