// Property tests for the resolver and serializer invariants.

use proptest::prelude::*;

use cartograph_core::diagnostics::Diagnostics;
use cartograph_core::model::{
    FileInfo, FunctionInfo, ResolutionStatus, SymbolId, SymbolKind,
};
use cartograph_core::resolve::{resolve, SymbolTable};
use cartograph_languages::Fidelity;

fn make_function(path: &str, name: &str, index: usize, calls: Vec<String>) -> FunctionInfo {
    let line = index * 10 + 1;
    FunctionInfo {
        name: name.to_string(),
        id: SymbolId::new(path, SymbolKind::Function, name, line),
        file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
        start_line: line,
        length: 2,
        parameters: Vec::new(),
        return_type: None,
        docstring: None,
        calls_to: calls,
        referenced_in: Vec::new(),
        confidence: Fidelity::Structural,
    }
}

fn make_files(shape: &[Vec<(String, Vec<String>)>]) -> Vec<FileInfo> {
    shape.iter()
        .enumerate()
        .map(|(file_idx, functions)| {
            let path = format!("f{file_idx}.py");
            let functions = functions
                .iter()
                .enumerate()
                .map(|(fn_idx, (name, calls))| make_function(&path, name, fn_idx, calls.clone()))
                .collect();
            FileInfo {
                path,
                language: "python".to_string(),
                functions,
                types: Vec::new(),
                variables: Vec::new(),
                dependencies: Vec::new(),
                exports: Vec::new(),
                detailed_dependencies: Vec::new(),
                fidelity: Fidelity::Structural,
            }
        })
        .collect()
}

/// A small closed alphabet so collisions (duplicate declarations, unresolved
/// names) actually happen.
fn file_shape() -> impl Strategy<Value = Vec<Vec<(String, Vec<String>)>>> {
    let name = prop::sample::select(vec![
        "alpha".to_string(),
        "beta".to_string(),
        "gamma".to_string(),
        "delta".to_string(),
    ]);
    let function = (name.clone(), prop::collection::vec(name, 0..4));
    prop::collection::vec(prop::collection::vec(function, 0..4), 1..4)
}

proptest! {
    #[test]
    fn no_reference_is_dropped_and_statuses_are_consistent(shape in file_shape()) {
        let mut files = make_files(&shape);
        let table = SymbolTable::build(&files);
        let mut diags = Diagnostics::default();
        resolve(&mut files, &table, &mut diags);

        let total_calls: usize = shape
            .iter()
            .flatten()
            .map(|(_, calls)| calls.len())
            .sum();
        let total_edges: usize = files.iter().map(|f| f.detailed_dependencies.len()).sum();
        prop_assert_eq!(total_calls, total_edges);
        prop_assert_eq!(
            total_edges,
            diags.resolved_edges + diags.unresolved_edges + diags.ambiguous_edges
        );

        for edge in files.iter().flat_map(|f| &f.detailed_dependencies) {
            match edge.status {
                ResolutionStatus::Resolved => {
                    prop_assert!(edge.target.is_some());
                    prop_assert!(edge.candidates.is_empty());
                }
                ResolutionStatus::Unresolved => {
                    prop_assert!(edge.target.is_none());
                    prop_assert!(edge.candidates.is_empty());
                }
                ResolutionStatus::Ambiguous => {
                    prop_assert!(edge.target.is_none());
                    prop_assert!(edge.candidates.len() >= 2);
                }
            }
        }
    }

    #[test]
    fn resolution_is_deterministic(shape in file_shape()) {
        let mut first = make_files(&shape);
        let mut second = make_files(&shape);

        let table_a = SymbolTable::build(&first);
        let table_b = SymbolTable::build(&second);
        resolve(&mut first, &table_a, &mut Diagnostics::default());
        resolve(&mut second, &table_b, &mut Diagnostics::default());

        prop_assert_eq!(first, second);
    }
}
