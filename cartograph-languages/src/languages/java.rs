use std::path::Path;

use crate::classify::Language;
use crate::{Extraction, RawAttribute, RawFunction, RawImport, RawParam, RawSymbols, RawType};

use super::helpers::{
    block_doc_above, child_by_field, find_child_by_kind, line_span, node_text, parse,
};
use super::{structural_fallback, Extractor};

#[derive(Debug)]
pub struct JavaExtractor;

impl Extractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract(&self, source: &str, path: &Path) -> Extraction {
        match parse(source, &tree_sitter_java::LANGUAGE.into()) {
            Some(tree) if !tree.root_node().has_error() => {
                Extraction::structural(collect(tree.root_node(), source))
            }
            _ => structural_fallback(Language::Java, source, path),
        }
    }
}

fn collect(root: tree_sitter::Node<'_>, source: &str) -> RawSymbols {
    let mut symbols = RawSymbols::default();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                if let Some(ty) = extract_type(child, source) {
                    if is_public(child, source) {
                        symbols.exports.push(ty.name.clone());
                    }
                    symbols.types.push(ty);
                }
            }
            "import_declaration" => {
                let text = node_text(child, source);
                let import_path = text
                    .strip_prefix("import ")
                    .unwrap_or(text)
                    .trim_end_matches(';')
                    .trim();
                symbols.imports.push(RawImport {
                    target: import_path.to_string(),
                    line: line_span(child).start,
                });
            }
            _ => {}
        }
    }
    symbols
}

fn is_public(node: tree_sitter::Node<'_>, source: &str) -> bool {
    find_child_by_kind(node, "modifiers")
        .is_some_and(|mods| node_text(mods, source).contains("public"))
}

fn extract_type(node: tree_sitter::Node<'_>, source: &str) -> Option<RawType> {
    let name_node = child_by_field(node, "name")?;
    let mut ty = RawType {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        supertypes: Vec::new(),
        methods: Vec::new(),
        attributes: Vec::new(),
        docstring: block_doc_above(node, source),
    };

    // extends
    if let Some(superclass) = child_by_field(node, "superclass") {
        collect_type_names(superclass, source, &mut ty.supertypes);
    }
    // implements
    if let Some(interfaces) = child_by_field(node, "interfaces") {
        collect_type_names(interfaces, source, &mut ty.supertypes);
    }
    // interface extends
    if let Some(extends) = find_child_by_kind(node, "extends_interfaces") {
        collect_type_names(extends, source, &mut ty.supertypes);
    }

    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    if let Some(method) = extract_method(member, source) {
                        ty.methods.push(method);
                    }
                }
                "field_declaration" => {
                    let type_name = child_by_field(member, "type")
                        .map(|n| node_text(n, source).to_string());
                    let mut inner = member.walk();
                    for decl in member.children(&mut inner) {
                        if decl.kind() == "variable_declarator" {
                            if let Some(fname) = child_by_field(decl, "name") {
                                ty.attributes.push(RawAttribute {
                                    name: node_text(fname, source).to_string(),
                                    type_name: type_name.clone(),
                                });
                            }
                        }
                    }
                }
                // Nested types surface as attributes of the outer type
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    if let Some(inner_name) = child_by_field(member, "name") {
                        ty.attributes.push(RawAttribute {
                            name: node_text(inner_name, source).to_string(),
                            type_name: None,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Some(ty)
}

fn collect_type_names(node: tree_sitter::Node<'_>, source: &str, out: &mut Vec<String>) {
    if node.kind() == "type_identifier" {
        out.push(node_text(node, source).to_string());
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_type_names(child, source, out);
    }
}

fn extract_method(node: tree_sitter::Node<'_>, source: &str) -> Option<RawFunction> {
    let name_node = child_by_field(node, "name")?;
    let mut method = RawFunction {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        params: extract_params(node, source),
        return_type: child_by_field(node, "type").map(|n| node_text(n, source).to_string()),
        docstring: block_doc_above(node, source),
        calls: Vec::new(),
    };
    if let Some(body) = child_by_field(node, "body") {
        collect_calls(body, source, &mut method.calls);
    }
    Some(method)
}

fn extract_params(node: tree_sitter::Node<'_>, source: &str) -> Vec<RawParam> {
    let Some(params_node) = child_by_field(node, "parameters") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        if child.kind() == "formal_parameter" || child.kind() == "spread_parameter" {
            if let Some(name) = child_by_field(child, "name") {
                params.push(RawParam {
                    name: node_text(name, source).to_string(),
                    type_name: child_by_field(child, "type")
                        .map(|n| node_text(n, source).to_string()),
                });
            }
        }
    }
    params
}

fn collect_calls(node: tree_sitter::Node<'_>, source: &str, calls: &mut Vec<String>) {
    if node.kind() == "method_invocation" {
        if let Some(name) = child_by_field(node, "name") {
            calls.push(node_text(name, source).to_string());
        }
    } else if node.kind() == "object_creation_expression" {
        if let Some(ty) = child_by_field(node, "type") {
            calls.push(node_text(ty, source).to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, calls);
    }
}
