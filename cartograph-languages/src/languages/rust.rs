use std::path::Path;

use crate::classify::Language;
use crate::{
    Extraction, RawAttribute, RawFunction, RawImport, RawParam, RawScope, RawSymbols, RawType,
    RawVariable,
};

use super::helpers::{
    child_by_field, doc_lines_above, find_child_by_kind, line_span, node_text, parse,
    simple_literal, trailing_name,
};
use super::{structural_fallback, Extractor};

const LITERAL_KINDS: &[&str] = &[
    "integer_literal",
    "float_literal",
    "string_literal",
    "boolean_literal",
    "char_literal",
];

#[derive(Debug)]
pub struct RustExtractor;

impl Extractor for RustExtractor {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extract(&self, source: &str, path: &Path) -> Extraction {
        match parse(source, &tree_sitter_rust::LANGUAGE.into()) {
            Some(tree) if !tree.root_node().has_error() => {
                Extraction::structural(collect(tree.root_node(), source))
            }
            _ => structural_fallback(Language::Rust, source, path),
        }
    }
}

struct ImplBlock {
    type_name: String,
    trait_name: Option<String>,
    methods: Vec<RawFunction>,
}

fn collect(root: tree_sitter::Node<'_>, source: &str) -> RawSymbols {
    let mut symbols = RawSymbols::default();
    // Impl blocks can precede the type declaration; attach after the walk.
    let mut impls: Vec<ImplBlock> = Vec::new();
    walk_items(root, source, &mut symbols, &mut impls);

    for block in impls {
        if let Some(ty) = symbols.types.iter_mut().find(|t| t.name == block.type_name) {
            if let Some(trait_name) = block.trait_name {
                ty.supertypes.push(trait_name);
            }
            ty.methods.extend(block.methods);
        } else {
            // Impl for a type declared elsewhere — methods stay file-level.
            symbols.functions.extend(block.methods);
        }
    }

    symbols
}

fn walk_items(
    node: tree_sitter::Node<'_>,
    source: &str,
    symbols: &mut RawSymbols,
    impls: &mut Vec<ImplBlock>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_item" => {
                if let Some(func) = extract_function(child, source) {
                    if is_pub(child) {
                        symbols.exports.push(func.name.clone());
                    }
                    symbols.functions.push(func);
                }
            }
            "struct_item" | "enum_item" | "trait_item" => {
                if let Some(ty) = extract_type(child, source) {
                    if is_pub(child) {
                        symbols.exports.push(ty.name.clone());
                    }
                    symbols.types.push(ty);
                }
            }
            "impl_item" => {
                if let Some(block) = extract_impl(child, source) {
                    impls.push(block);
                }
            }
            "mod_item" => {
                // Inline modules contribute their items to the same file.
                if let Some(body) = child_by_field(child, "body") {
                    walk_items(body, source, symbols, impls);
                }
            }
            "use_declaration" => {
                if let Some(arg) = child_by_field(child, "argument") {
                    symbols.imports.push(RawImport {
                        target: node_text(arg, source).to_string(),
                        line: line_span(child).start,
                    });
                }
            }
            "const_item" | "static_item" => {
                if let Some(var) = extract_const(child, source) {
                    if is_pub(child) {
                        symbols.exports.push(var.name.clone());
                    }
                    symbols.variables.push(var);
                }
            }
            _ => {}
        }
    }
}

fn is_pub(node: tree_sitter::Node<'_>) -> bool {
    find_child_by_kind(node, "visibility_modifier").is_some()
}

fn extract_function(node: tree_sitter::Node<'_>, source: &str) -> Option<RawFunction> {
    let name_node = child_by_field(node, "name")?;
    let mut func = RawFunction {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        params: extract_params(node, source),
        return_type: child_by_field(node, "return_type")
            .map(|n| node_text(n, source).to_string()),
        docstring: doc_lines_above(node, source, "///"),
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
            "parameter" => {
                if let Some(pattern) = child_by_field(child, "pattern") {
                    params.push(RawParam {
                        name: node_text(pattern, source).to_string(),
                        type_name: child_by_field(child, "type")
                            .map(|n| node_text(n, source).to_string()),
                    });
                }
            }
            "self_parameter" => {
                params.push(RawParam {
                    name: "self".to_string(),
                    type_name: None,
                });
            }
            _ => {}
        }
    }
    params
}

fn collect_calls(node: tree_sitter::Node<'_>, source: &str, calls: &mut Vec<String>) {
    if node.kind() == "call_expression" {
        if let Some(func) = child_by_field(node, "function") {
            calls.push(trailing_name(node_text(func, source)).to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, calls);
    }
}

fn extract_type(node: tree_sitter::Node<'_>, source: &str) -> Option<RawType> {
    let name_node = child_by_field(node, "name")?;
    let mut ty = RawType {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        supertypes: Vec::new(),
        methods: Vec::new(),
        attributes: Vec::new(),
        docstring: doc_lines_above(node, source, "///"),
    };

    match node.kind() {
        "struct_item" => {
            if let Some(body) = child_by_field(node, "body") {
                let mut cursor = body.walk();
                for field in body.children(&mut cursor) {
                    if field.kind() == "field_declaration" {
                        if let Some(fname) = child_by_field(field, "name") {
                            ty.attributes.push(RawAttribute {
                                name: node_text(fname, source).to_string(),
                                type_name: child_by_field(field, "type")
                                    .map(|n| node_text(n, source).to_string()),
                            });
                        }
                    }
                }
            }
        }
        "enum_item" => {
            if let Some(body) = child_by_field(node, "body") {
                let mut cursor = body.walk();
                for variant in body.children(&mut cursor) {
                    if variant.kind() == "enum_variant" {
                        if let Some(vname) = child_by_field(variant, "name") {
                            ty.attributes.push(RawAttribute {
                                name: node_text(vname, source).to_string(),
                                type_name: None,
                            });
                        }
                    }
                }
            }
        }
        "trait_item" => {
            if let Some(body) = child_by_field(node, "body") {
                let mut cursor = body.walk();
                for item in body.children(&mut cursor) {
                    if matches!(item.kind(), "function_item" | "function_signature_item") {
                        if let Some(method) = extract_function(item, source) {
                            ty.methods.push(method);
                        }
                    }
                }
            }
        }
        _ => {}
    }

    Some(ty)
}

/// A trait impl records the trait as a supertype of the implementing type.
fn extract_impl(node: tree_sitter::Node<'_>, source: &str) -> Option<ImplBlock> {
    let type_node = child_by_field(node, "type")?;
    let type_text = node_text(type_node, source);
    let type_name = trailing_name(type_text.split('<').next().unwrap_or(type_text)).to_string();
    let trait_name = child_by_field(node, "trait").map(|n| node_text(n, source).to_string());

    let mut methods = Vec::new();
    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for item in body.children(&mut cursor) {
            if item.kind() == "function_item" {
                if let Some(method) = extract_function(item, source) {
                    methods.push(method);
                }
            }
        }
    }

    Some(ImplBlock {
        type_name,
        trait_name,
        methods,
    })
}

fn extract_const(node: tree_sitter::Node<'_>, source: &str) -> Option<RawVariable> {
    let name_node = child_by_field(node, "name")?;
    Some(RawVariable {
        name: node_text(name_node, source).to_string(),
        line: line_span(node).start,
        type_name: child_by_field(node, "type").map(|n| node_text(n, source).to_string()),
        value: child_by_field(node, "value")
            .and_then(|n| simple_literal(n, source, LITERAL_KINDS)),
        scope: RawScope::File,
    })
}
