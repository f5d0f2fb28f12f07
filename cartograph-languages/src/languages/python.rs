use std::path::Path;

use crate::classify::Language;
use crate::{
    Extraction, RawAttribute, RawFunction, RawImport, RawParam, RawScope, RawSymbols, RawType,
    RawVariable,
};

use super::helpers::{
    child_by_field, find_child_by_kind, line_span, node_text, parse, simple_literal,
};
use super::{structural_fallback, Extractor};

const LITERAL_KINDS: &[&str] = &["string", "integer", "float", "true", "false", "none"];

#[derive(Debug)]
pub struct PythonExtractor;

impl Extractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract(&self, source: &str, path: &Path) -> Extraction {
        match parse(source, &tree_sitter_python::LANGUAGE.into()) {
            Some(tree) if !tree.root_node().has_error() => {
                let mut symbols = RawSymbols::default();
                walk_module(tree.root_node(), source, &mut symbols);
                Extraction::structural(symbols)
            }
            _ => structural_fallback(Language::Python, source, path),
        }
    }
}

fn walk_module(node: tree_sitter::Node<'_>, source: &str, symbols: &mut RawSymbols) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let stmt = unwrap_decorated(child);
        match stmt.kind() {
            "function_definition" => {
                if let Some(func) = extract_function(stmt, source) {
                    symbols.exports.push(func.name.clone());
                    symbols.functions.push(func);
                }
            }
            "class_definition" => {
                if let Some(ty) = extract_class(stmt, source) {
                    symbols.exports.push(ty.name.clone());
                    symbols.types.push(ty);
                }
            }
            "import_statement" => extract_import(stmt, source, symbols),
            "import_from_statement" => {
                if let Some(module) = child_by_field(stmt, "module_name") {
                    symbols.imports.push(RawImport {
                        target: node_text(module, source).to_string(),
                        line: line_span(stmt).start,
                    });
                }
            }
            "expression_statement" => {
                if let Some(assign) = find_child_by_kind(stmt, "assignment") {
                    if let Some(var) = extract_variable(assign, source, RawScope::File) {
                        symbols.variables.push(var);
                    }
                }
            }
            _ => {}
        }
    }
}

fn unwrap_decorated(node: tree_sitter::Node<'_>) -> tree_sitter::Node<'_> {
    if node.kind() == "decorated_definition" {
        child_by_field(node, "definition").unwrap_or(node)
    } else {
        node
    }
}

fn extract_function(node: tree_sitter::Node<'_>, source: &str) -> Option<RawFunction> {
    let name_node = child_by_field(node, "name")?;
    let mut func = RawFunction {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        params: extract_params(node, source),
        return_type: child_by_field(node, "return_type")
            .map(|n| node_text(n, source).to_string()),
        docstring: extract_docstring(node, source),
        calls: Vec::new(),
    };
    if let Some(body) = child_by_field(node, "body") {
        collect_calls(body, source, &mut func.calls);
    }
    Some(func)
}

fn extract_params(node: tree_sitter::Node<'_>, source: &str) -> Vec<RawParam> {
    let Some(params_node) = child_by_field(node, "parameters") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        match child.kind() {
            "identifier" => params.push(RawParam {
                name: node_text(child, source).to_string(),
                type_name: None,
            }),
            "typed_parameter" | "typed_default_parameter" => {
                let name = child_by_field(child, "name")
                    .or_else(|| find_child_by_kind(child, "identifier"));
                if let Some(name) = name {
                    params.push(RawParam {
                        name: node_text(name, source).to_string(),
                        type_name: child_by_field(child, "type")
                            .map(|n| node_text(n, source).to_string()),
                    });
                }
            }
            "default_parameter" => {
                if let Some(name) = child_by_field(child, "name") {
                    params.push(RawParam {
                        name: node_text(name, source).to_string(),
                        type_name: None,
                    });
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                if let Some(name) = find_child_by_kind(child, "identifier") {
                    params.push(RawParam {
                        name: node_text(name, source).to_string(),
                        type_name: None,
                    });
                }
            }
            _ => {}
        }
    }
    params
}

fn collect_calls(node: tree_sitter::Node<'_>, source: &str, calls: &mut Vec<String>) {
    if node.kind() == "call" {
        if let Some(func) = child_by_field(node, "function") {
            let target = match func.kind() {
                "identifier" => Some(node_text(func, source).to_string()),
                "attribute" => {
                    child_by_field(func, "attribute").map(|a| node_text(a, source).to_string())
                }
                _ => None,
            };
            if let Some(target) = target {
                calls.push(target);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, calls);
    }
}

fn extract_class(node: tree_sitter::Node<'_>, source: &str) -> Option<RawType> {
    let name_node = child_by_field(node, "name")?;
    let mut ty = RawType {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        supertypes: Vec::new(),
        methods: Vec::new(),
        attributes: Vec::new(),
        docstring: extract_docstring(node, source),
    };

    if let Some(supers) = child_by_field(node, "superclasses") {
        let mut cursor = supers.walk();
        for base in supers.children(&mut cursor) {
            if matches!(base.kind(), "identifier" | "attribute") {
                ty.supertypes.push(node_text(base, source).to_string());
            }
        }
    }

    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for item in body.children(&mut cursor) {
            let stmt = unwrap_decorated(item);
            match stmt.kind() {
                "function_definition" => {
                    if let Some(method) = extract_function(stmt, source) {
                        ty.methods.push(method);
                    }
                }
                "expression_statement" => {
                    if let Some(assign) = find_child_by_kind(stmt, "assignment") {
                        if let Some(left) = child_by_field(assign, "left") {
                            if left.kind() == "identifier" {
                                ty.attributes.push(RawAttribute {
                                    name: node_text(left, source).to_string(),
                                    type_name: child_by_field(assign, "type")
                                        .map(|n| node_text(n, source).to_string()),
                                });
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Some(ty)
}

fn extract_variable(
    assign: tree_sitter::Node<'_>,
    source: &str,
    scope: RawScope,
) -> Option<RawVariable> {
    let left = child_by_field(assign, "left")?;
    if left.kind() != "identifier" {
        return None;
    }
    Some(RawVariable {
        name: node_text(left, source).to_string(),
        line: line_span(assign).start,
        type_name: child_by_field(assign, "type").map(|n| node_text(n, source).to_string()),
        value: child_by_field(assign, "right")
            .and_then(|n| simple_literal(n, source, LITERAL_KINDS)),
        scope,
    })
}

fn extract_import(node: tree_sitter::Node<'_>, source: &str, symbols: &mut RawSymbols) {
    let line = line_span(node).start;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => symbols.imports.push(RawImport {
                target: node_text(child, source).to_string(),
                line,
            }),
            "aliased_import" => {
                if let Some(name) = child_by_field(child, "name") {
                    symbols.imports.push(RawImport {
                        target: node_text(name, source).to_string(),
                        line,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Docstring is the first statement of the body when it is a bare string.
fn extract_docstring(node: tree_sitter::Node<'_>, source: &str) -> Option<String> {
    let body = child_by_field(node, "body")?;
    let mut cursor = body.walk();
    let first = body.children(&mut cursor).next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let mut inner = first.walk();
    let expr = first.children(&mut inner).next()?;
    if expr.kind() != "string" {
        return None;
    }

    let text = node_text(expr, source);
    let content = text
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .or_else(|| text.strip_prefix("'''").and_then(|s| s.strip_suffix("'''")))
        .or_else(|| text.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .or_else(|| text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(text)
        .trim()
        .to_string();

    if content.is_empty() { None } else { Some(content) }
}
