use std::path::Path;

use crate::classify::Language;
use crate::{
    Extraction, RawAttribute, RawFunction, RawImport, RawParam, RawScope, RawSymbols, RawType,
    RawVariable,
};

use super::helpers::{
    child_by_field, doc_lines_above, find_child_by_kind, line_span, node_text, parse,
    simple_literal,
};
use super::{structural_fallback, Extractor};

const LITERAL_KINDS: &[&str] = &[
    "int_literal",
    "float_literal",
    "interpreted_string_literal",
    "raw_string_literal",
    "rune_literal",
    "true",
    "false",
];

#[derive(Debug)]
pub struct GoExtractor;

impl Extractor for GoExtractor {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extract(&self, source: &str, path: &Path) -> Extraction {
        match parse(source, &tree_sitter_go::LANGUAGE.into()) {
            Some(tree) if !tree.root_node().has_error() => {
                Extraction::structural(collect(tree.root_node(), source))
            }
            _ => structural_fallback(Language::Go, source, path),
        }
    }
}

fn collect(root: tree_sitter::Node<'_>, source: &str) -> RawSymbols {
    let mut symbols = RawSymbols::default();
    // Methods can precede their receiver type; attach after the full walk.
    let mut pending_methods: Vec<(String, RawFunction)> = Vec::new();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                if let Some(func) = extract_function(child, source) {
                    if is_exported(&func.name) {
                        symbols.exports.push(func.name.clone());
                    }
                    symbols.functions.push(func);
                }
            }
            "method_declaration" => {
                if let Some((receiver, method)) = extract_method(child, source) {
                    pending_methods.push((receiver, method));
                }
            }
            "type_declaration" => extract_types(child, source, &mut symbols),
            "import_declaration" => extract_imports(child, source, &mut symbols),
            "var_declaration" | "const_declaration" => {
                extract_variables(child, source, &mut symbols);
            }
            _ => {}
        }
    }

    for (receiver, method) in pending_methods {
        if let Some(ty) = symbols.types.iter_mut().find(|t| t.name == receiver) {
            ty.methods.push(method);
        } else {
            symbols.functions.push(method);
        }
    }

    symbols
}

/// Go exports by capitalization.
fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn extract_function(node: tree_sitter::Node<'_>, source: &str) -> Option<RawFunction> {
    let name_node = child_by_field(node, "name")?;
    let mut func = RawFunction {
        name: node_text(name_node, source).to_string(),
        span: line_span(node),
        params: extract_params(child_by_field(node, "parameters"), source),
        return_type: child_by_field(node, "result").map(|n| node_text(n, source).to_string()),
        docstring: doc_lines_above(node, source, "//"),
        calls: Vec::new(),
    };
    if let Some(body) = child_by_field(node, "body") {
        collect_calls(body, source, &mut func.calls);
    }
    Some(func)
}

fn extract_method(node: tree_sitter::Node<'_>, source: &str) -> Option<(String, RawFunction)> {
    let receiver = child_by_field(node, "receiver")?;
    let receiver_decl = find_child_by_kind(receiver, "parameter_declaration")?;
    let receiver_type = child_by_field(receiver_decl, "type")?;
    let type_name = node_text(receiver_type, source)
        .trim_start_matches('*')
        .to_string();
    let method = extract_function(node, source)?;
    Some((type_name, method))
}

fn extract_params(
    params_node: Option<tree_sitter::Node<'_>>,
    source: &str,
) -> Vec<RawParam> {
    let Some(params_node) = params_node else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let mut cursor = params_node.walk();
    for decl in params_node.children(&mut cursor) {
        if decl.kind() != "parameter_declaration" && decl.kind() != "variadic_parameter_declaration"
        {
            continue;
        }
        let type_name = child_by_field(decl, "type").map(|n| node_text(n, source).to_string());
        // One declaration can name several parameters: `a, b int`
        let mut inner = decl.walk();
        let mut named_any = false;
        for child in decl.children(&mut inner) {
            if child.kind() == "identifier" {
                params.push(RawParam {
                    name: node_text(child, source).to_string(),
                    type_name: type_name.clone(),
                });
                named_any = true;
            }
        }
        if !named_any {
            if let Some(ty) = type_name {
                params.push(RawParam {
                    name: "_".to_string(),
                    type_name: Some(ty),
                });
            }
        }
    }
    params
}

fn collect_calls(node: tree_sitter::Node<'_>, source: &str, calls: &mut Vec<String>) {
    if node.kind() == "call_expression" {
        if let Some(func) = child_by_field(node, "function") {
            let target = match func.kind() {
                "identifier" => Some(node_text(func, source).to_string()),
                "selector_expression" => {
                    child_by_field(func, "field").map(|f| node_text(f, source).to_string())
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

fn extract_types(node: tree_sitter::Node<'_>, source: &str, symbols: &mut RawSymbols) {
    let mut cursor = node.walk();
    for spec in node.children(&mut cursor) {
        if spec.kind() != "type_spec" {
            continue;
        }
        let Some(name_node) = child_by_field(spec, "name") else {
            continue;
        };
        let mut ty = RawType {
            name: node_text(name_node, source).to_string(),
            span: line_span(spec),
            supertypes: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            docstring: doc_lines_above(node, source, "//"),
        };

        if let Some(type_node) = child_by_field(spec, "type") {
            match type_node.kind() {
                "struct_type" => extract_struct_fields(type_node, source, &mut ty),
                "interface_type" => extract_interface_members(type_node, source, &mut ty),
                _ => {}
            }
        }

        if is_exported(&ty.name) {
            symbols.exports.push(ty.name.clone());
        }
        symbols.types.push(ty);
    }
}

fn extract_struct_fields(node: tree_sitter::Node<'_>, source: &str, ty: &mut RawType) {
    let Some(fields) = find_child_by_kind(node, "field_declaration_list") else {
        return;
    };
    let mut cursor = fields.walk();
    for field in fields.children(&mut cursor) {
        if field.kind() != "field_declaration" {
            continue;
        }
        let type_name = child_by_field(field, "type").map(|n| node_text(n, source).to_string());
        let mut named_any = false;
        let mut inner = field.walk();
        for child in field.children(&mut inner) {
            if child.kind() == "field_identifier" {
                ty.attributes.push(RawAttribute {
                    name: node_text(child, source).to_string(),
                    type_name: type_name.clone(),
                });
                named_any = true;
            }
        }
        // Embedded field — treated as a supertype name
        if !named_any {
            if let Some(embedded) = type_name {
                ty.supertypes.push(embedded.trim_start_matches('*').to_string());
            }
        }
    }
}

fn extract_interface_members(node: tree_sitter::Node<'_>, source: &str, ty: &mut RawType) {
    let mut cursor = node.walk();
    for member in node.children(&mut cursor) {
        match member.kind() {
            "method_elem" | "method_spec" => {
                if let Some(name) = child_by_field(member, "name") {
                    ty.methods.push(RawFunction {
                        name: node_text(name, source).to_string(),
                        span: line_span(member),
                        params: extract_params(child_by_field(member, "parameters"), source),
                        return_type: child_by_field(member, "result")
                            .map(|n| node_text(n, source).to_string()),
                        ..RawFunction::default()
                    });
                }
            }
            "type_identifier" => {
                ty.supertypes.push(node_text(member, source).to_string());
            }
            "type_elem" => {
                if let Some(embedded) = find_child_by_kind(member, "type_identifier") {
                    ty.supertypes.push(node_text(embedded, source).to_string());
                }
            }
            _ => {}
        }
    }
}

fn extract_imports(node: tree_sitter::Node<'_>, source: &str, symbols: &mut RawSymbols) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "import_spec" {
            if let Some(path_node) = child_by_field(current, "path") {
                symbols.imports.push(RawImport {
                    target: node_text(path_node, source).trim_matches('"').to_string(),
                    line: line_span(current).start,
                });
            }
            continue;
        }
        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
}

fn extract_variables(node: tree_sitter::Node<'_>, source: &str, symbols: &mut RawSymbols) {
    let mut cursor = node.walk();
    for spec in node.children(&mut cursor) {
        if spec.kind() != "var_spec" && spec.kind() != "const_spec" {
            continue;
        }
        let type_name = child_by_field(spec, "type").map(|n| node_text(n, source).to_string());
        let value = child_by_field(spec, "value")
            .and_then(|list| list.child(0))
            .and_then(|n| simple_literal(n, source, LITERAL_KINDS));
        let mut inner = spec.walk();
        for child in spec.children(&mut inner) {
            if child.kind() == "identifier" {
                let name = node_text(child, source).to_string();
                if is_exported(&name) {
                    symbols.exports.push(name.clone());
                }
                symbols.variables.push(RawVariable {
                    name,
                    line: line_span(spec).start,
                    type_name: type_name.clone(),
                    value: value.clone(),
                    scope: RawScope::File,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Extraction {
        GoExtractor.extract(source, Path::new("pkg/server.go"))
    }

    #[test]
    fn extracts_function_with_doc_and_calls() {
        let source = "package main\n\n// Serve starts the listener.\nfunc Serve(addr string) error {\n\treturn listen(addr)\n}\n";
        let ex = extract(source);

        assert_eq!(ex.fidelity, crate::Fidelity::Structural);
        let func = &ex.symbols.functions[0];
        assert_eq!(func.name, "Serve");
        assert_eq!(func.params[0].name, "addr");
        assert_eq!(func.params[0].type_name.as_deref(), Some("string"));
        assert_eq!(func.return_type.as_deref(), Some("error"));
        assert_eq!(func.docstring.as_deref(), Some("Serve starts the listener."));
        assert_eq!(func.calls, vec!["listen"]);
        assert_eq!(ex.symbols.exports, vec!["Serve"]);
    }

    #[test]
    fn attaches_methods_to_struct_even_when_declared_first() {
        let source = "package main\n\nfunc (s *Server) Start() {\n\ts.init()\n}\n\ntype Server struct {\n\tAddr string\n\tBase\n}\n";
        let ex = extract(source);

        let ty = &ex.symbols.types[0];
        assert_eq!(ty.name, "Server");
        assert_eq!(ty.attributes[0].name, "Addr");
        assert_eq!(ty.supertypes, vec!["Base"]);
        assert_eq!(ty.methods[0].name, "Start");
        assert_eq!(ty.methods[0].calls, vec!["init"]);
    }

    #[test]
    fn extracts_grouped_imports_and_consts() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\t\"net/http\"\n)\n\nconst MaxConns = 64\n";
        let ex = extract(source);

        let targets: Vec<_> = ex.symbols.imports.iter().map(|i| i.target.as_str()).collect();
        assert_eq!(targets, vec!["fmt", "net/http"]);
        assert_eq!(ex.symbols.variables[0].name, "MaxConns");
        assert_eq!(ex.symbols.variables[0].value.as_deref(), Some("64"));
    }

    #[test]
    fn interface_members_are_methods() {
        let source = "package main\n\ntype Store interface {\n\tGet(key string) string\n\tCloser\n}\n";
        let ex = extract(source);

        let ty = &ex.symbols.types[0];
        assert_eq!(ty.methods[0].name, "Get");
        assert_eq!(ty.supertypes, vec!["Closer"]);
    }
}
