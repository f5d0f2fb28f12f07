//! Symbol normalizer: converts an extractor's raw records into the unified
//! schema, assigning stable ids and carrying the extraction fidelity as a
//! confidence tag. Performs no cross-file work.

use cartograph_languages::{
    Extraction, Fidelity, Language, RawFunction, RawScope, RawType, RawVariable,
};

use crate::model::{
    AttributeInfo, FileInfo, FunctionInfo, ParamInfo, SymbolId, SymbolKind, TypeInfo, VariableInfo,
    VariableScope,
};

/// Normalize one file's extraction into a [`FileInfo`]. Detailed dependency
/// edges and `referenced_in` are left empty for the resolver.
pub fn normalize(path: &str, language: Language, extraction: Extraction) -> FileInfo {
    let Extraction {
        symbols, fidelity, ..
    } = extraction;
    let file_name = base_name(path);

    let functions = symbols
        .functions
        .into_iter()
        .map(|f| normalize_function(path, &file_name, f, fidelity))
        .collect();
    let types = symbols
        .types
        .into_iter()
        .map(|t| normalize_type(path, &file_name, t, fidelity))
        .collect();
    let variables = symbols
        .variables
        .into_iter()
        .map(|v| normalize_variable(path, &file_name, v, fidelity))
        .collect();

    FileInfo {
        path: path.to_string(),
        language: language.as_str().to_string(),
        functions,
        types,
        variables,
        dependencies: dedup_in_order(symbols.imports.iter().map(|i| i.target.clone())),
        exports: dedup_in_order(symbols.exports.into_iter()),
        detailed_dependencies: Vec::new(),
        fidelity,
    }
}

fn normalize_function(
    path: &str,
    file_name: &str,
    raw: RawFunction,
    fidelity: Fidelity,
) -> FunctionInfo {
    FunctionInfo {
        id: SymbolId::new(path, SymbolKind::Function, &raw.name, raw.span.start),
        name: raw.name,
        file_name: file_name.to_string(),
        start_line: raw.span.start,
        length: raw.span.line_count(),
        parameters: raw
            .params
            .into_iter()
            .map(|p| ParamInfo {
                name: p.name,
                type_name: p.type_name,
            })
            .collect(),
        return_type: raw.return_type,
        docstring: raw.docstring,
        calls_to: dedup_in_order(raw.calls.into_iter()),
        referenced_in: Vec::new(),
        confidence: fidelity,
    }
}

fn normalize_type(path: &str, file_name: &str, raw: RawType, fidelity: Fidelity) -> TypeInfo {
    TypeInfo {
        id: SymbolId::new(path, SymbolKind::Type, &raw.name, raw.span.start),
        name: raw.name,
        file_name: file_name.to_string(),
        start_line: raw.span.start,
        length: raw.span.line_count(),
        supertypes: dedup_in_order(raw.supertypes.into_iter()),
        methods: raw
            .methods
            .into_iter()
            .map(|m| normalize_function(path, file_name, m, fidelity))
            .collect(),
        attributes: raw
            .attributes
            .into_iter()
            .map(|a| AttributeInfo {
                name: a.name,
                type_name: a.type_name,
            })
            .collect(),
        docstring: raw.docstring,
        referenced_in: Vec::new(),
        confidence: fidelity,
    }
}

fn normalize_variable(
    path: &str,
    file_name: &str,
    raw: RawVariable,
    fidelity: Fidelity,
) -> VariableInfo {
    VariableInfo {
        id: SymbolId::new(path, SymbolKind::Variable, &raw.name, raw.line),
        name: raw.name,
        file_name: file_name.to_string(),
        start_line: raw.line,
        type_name: raw.type_name,
        value: raw.value,
        scope: match raw.scope {
            RawScope::File => VariableScope::Global,
            RawScope::Type(_) => VariableScope::Class,
            RawScope::Function(_) => VariableScope::Local,
        },
        confidence: fidelity,
    }
}

fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn dedup_in_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
