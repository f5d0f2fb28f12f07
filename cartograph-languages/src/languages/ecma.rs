//! Shared walker for the ECMAScript family. Handles the constructs common
//! to TypeScript and JavaScript plus TS-only declarations (interfaces, type
//! aliases, enums), so the two extractors differ only in grammar.

use crate::{
    RawAttribute, RawFunction, RawImport, RawParam, RawScope, RawSymbols, RawType, RawVariable,
};

use super::helpers::{
    block_doc_above, child_by_field, find_child_by_kind, line_span, node_text, simple_literal,
};

const LITERAL_KINDS: &[&str] = &["string", "number", "true", "false", "null", "undefined"];

pub fn collect(root: tree_sitter::Node<'_>, source: &str) -> RawSymbols {
    let mut symbols = RawSymbols::default();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walk_statement(child, child, source, &mut symbols);
    }
    symbols
}

/// `doc_node` is the outermost node for doc-comment lookup — an export
/// statement wraps its declaration, and the comment sits above the wrapper.
fn walk_statement(
    node: tree_sitter::Node<'_>,
    doc_node: tree_sitter::Node<'_>,
    source: &str,
    symbols: &mut RawSymbols,
) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(func) = extract_function(node, doc_node, source) {
                symbols.exports.push(func.name.clone());
                symbols.functions.push(func);
            }
        }
        "class_declaration" => {
            if let Some(ty) = extract_class(node, doc_node, source) {
                symbols.exports.push(ty.name.clone());
                symbols.types.push(ty);
            }
        }
        "interface_declaration" => {
            if let Some(ty) = extract_interface(node, doc_node, source) {
                symbols.exports.push(ty.name.clone());
                symbols.types.push(ty);
            }
        }
        "type_alias_declaration" | "enum_declaration" => {
            if let Some(name_node) = child_by_field(node, "name") {
                let ty = RawType {
                    name: node_text(name_node, source).to_string(),
                    span: line_span(node),
                    docstring: block_doc_above(doc_node, source),
                    ..RawType::default()
                };
                symbols.exports.push(ty.name.clone());
                symbols.types.push(ty);
            }
        }
        "import_statement" => {
            if let Some(src) = child_by_field(node, "source") {
                symbols.imports.push(RawImport {
                    target: strip_quotes(node_text(src, source)),
                    line: line_span(node).start,
                });
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            extract_declarators(node, source, symbols);
        }
        "export_statement" => {
            if let Some(decl) = child_by_field(node, "declaration") {
                walk_statement(decl, node, source, symbols);
            } else {
                // export { a, b as c }
                let mut cursor = node.walk();
                collect_export_specifiers(node, source, symbols, &mut cursor);
            }
        }
        _ => {}
    }
}

fn collect_export_specifiers<'a>(
    node: tree_sitter::Node<'a>,
    source: &str,
    symbols: &mut RawSymbols,
    cursor: &mut tree_sitter::TreeCursor<'a>,
) {
    if let Some(clause) = find_child_by_kind(node, "export_clause") {
        for spec in clause.children(cursor) {
            if spec.kind() == "export_specifier" {
                let exported = child_by_field(spec, "alias").or(child_by_field(spec, "name"));
                if let Some(name) = exported {
                    symbols.exports.push(node_text(name, source).to_string());
                }
            }
        }
    }
}

fn extract_function(
    node: tree_sitter::Node<'_>,
    doc_node: tree_sitter::Node<'_>,
    source: &str,
) -> Option<RawFunction> {
    let name_node = child_by_field(node, "name")?;
    let mut func = RawFunction {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        params: extract_params(node, source),
        return_type: child_by_field(node, "return_type").map(|n| annotation_text(n, source)),
        docstring: block_doc_above(doc_node, source),
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
            "required_parameter" | "optional_parameter" => {
                if let Some(pattern) = child_by_field(child, "pattern") {
                    params.push(RawParam {
                        name: node_text(pattern, source).to_string(),
                        type_name: child_by_field(child, "type")
                            .map(|n| annotation_text(n, source)),
                    });
                }
            }
            _ => {}
        }
    }
    params
}

fn collect_calls(node: tree_sitter::Node<'_>, source: &str, calls: &mut Vec<String>) {
    if node.kind() == "call_expression" {
        if let Some(func) = child_by_field(node, "function") {
            let target = match func.kind() {
                "identifier" => Some(node_text(func, source).to_string()),
                "member_expression" => {
                    child_by_field(func, "property").map(|p| node_text(p, source).to_string())
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

fn extract_class(
    node: tree_sitter::Node<'_>,
    doc_node: tree_sitter::Node<'_>,
    source: &str,
) -> Option<RawType> {
    let name_node = child_by_field(node, "name")?;
    let mut ty = RawType {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        supertypes: collect_heritage(node, source),
        methods: Vec::new(),
        attributes: Vec::new(),
        docstring: block_doc_above(doc_node, source),
    };

    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_definition" => {
                    if let Some(name_node) = child_by_field(member, "name") {
                        let mut method = RawFunction {
                            name: node_text(name_node, source).to_string(),
                            span: line_span(member),
                            params: extract_params(member, source),
                            return_type: child_by_field(member, "return_type")
                                .map(|n| annotation_text(n, source)),
                            docstring: block_doc_above(member, source),
                            calls: Vec::new(),
                        };
                        if let Some(body) = child_by_field(member, "body") {
                            collect_calls(body, source, &mut method.calls);
                        }
                        ty.methods.push(method);
                    }
                }
                "field_definition" | "public_field_definition" => {
                    // TS names the field `name`, JS names it `property`.
                    let prop = child_by_field(member, "name")
                        .or_else(|| child_by_field(member, "property"));
                    if let Some(prop) = prop {
                        ty.attributes.push(RawAttribute {
                            name: node_text(prop, source).to_string(),
                            type_name: child_by_field(member, "type")
                                .map(|n| annotation_text(n, source)),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Some(ty)
}

/// Gather `extends`/`implements` names from the class heritage subtree.
fn collect_heritage(node: tree_sitter::Node<'_>, source: &str) -> Vec<String> {
    let Some(heritage) = find_child_by_kind(node, "class_heritage") else {
        return Vec::new();
    };
    let mut supertypes = Vec::new();
    collect_heritage_names(heritage, source, &mut supertypes);
    supertypes
}

fn collect_heritage_names(node: tree_sitter::Node<'_>, source: &str, out: &mut Vec<String>) {
    match node.kind() {
        "identifier" | "type_identifier" => {
            out.push(node_text(node, source).to_string());
            return;
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_heritage_names(child, source, out);
    }
}

fn extract_interface(
    node: tree_sitter::Node<'_>,
    doc_node: tree_sitter::Node<'_>,
    source: &str,
) -> Option<RawType> {
    let name_node = child_by_field(node, "name")?;
    let mut ty = RawType {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        supertypes: Vec::new(),
        methods: Vec::new(),
        attributes: Vec::new(),
        docstring: block_doc_above(doc_node, source),
    };

    if let Some(extends) = find_child_by_kind(node, "extends_type_clause") {
        collect_heritage_names(extends, source, &mut ty.supertypes);
    }

    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "property_signature" => {
                    if let Some(name) = child_by_field(member, "name") {
                        ty.attributes.push(RawAttribute {
                            name: node_text(name, source).to_string(),
                            type_name: child_by_field(member, "type")
                                .map(|n| annotation_text(n, source)),
                        });
                    }
                }
                "method_signature" => {
                    if let Some(name) = child_by_field(member, "name") {
                        ty.methods.push(RawFunction {
                            name: node_text(name, source).to_string(),
                            span: line_span(member),
                            params: extract_params(member, source),
                            return_type: child_by_field(member, "return_type")
                                .map(|n| annotation_text(n, source)),
                            ..RawFunction::default()
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Some(ty)
}

/// Module-level `const`/`let`/`var`. An arrow-function initializer counts as
/// a function declaration under the bound name; simple literals keep their
/// value; anything else is value-unknown.
fn extract_declarators(node: tree_sitter::Node<'_>, source: &str, symbols: &mut RawSymbols) {
    let mut cursor = node.walk();
    for decl in node.children(&mut cursor) {
        if decl.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = child_by_field(decl, "name") else {
            continue;
        };
        let name = node_text(name_node, source).to_string();
        let value = child_by_field(decl, "value");

        if let Some(value) = value {
            if matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
                let mut func = RawFunction {
                    name: name.clone(),
                    span: line_span(decl),
                    params: extract_params(value, source),
                    return_type: child_by_field(value, "return_type")
                        .map(|n| annotation_text(n, source)),
                    docstring: block_doc_above(node, source),
                    calls: Vec::new(),
                };
                if let Some(body) = child_by_field(value, "body") {
                    collect_calls(body, source, &mut func.calls);
                }
                symbols.exports.push(name);
                symbols.functions.push(func);
                continue;
            }
        }

        symbols.variables.push(RawVariable {
            name,
            line: line_span(decl).start,
            type_name: child_by_field(decl, "type").map(|n| annotation_text(n, source)),
            value: value.and_then(|n| simple_literal(n, source, LITERAL_KINDS)),
            scope: RawScope::File,
        });
    }
}

/// Type annotation text without the leading `:`.
fn annotation_text(node: tree_sitter::Node<'_>, source: &str) -> String {
    node_text(node, source)
        .trim_start_matches(':')
        .trim()
        .to_string()
}

fn strip_quotes(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}
