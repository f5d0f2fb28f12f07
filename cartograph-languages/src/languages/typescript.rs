use std::path::Path;

use crate::classify::Language;
use crate::Extraction;

use super::helpers::parse;
use super::{ecma, structural_fallback, Extractor};

#[derive(Debug)]
pub struct TypeScriptExtractor;

impl Extractor for TypeScriptExtractor {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn extract(&self, source: &str, path: &Path) -> Extraction {
        let grammar = if path.extension().is_some_and(|e| e == "tsx") {
            tree_sitter_typescript::LANGUAGE_TSX
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT
        };
        match parse(source, &grammar.into()) {
            Some(tree) if !tree.root_node().has_error() => {
                Extraction::structural(ecma::collect(tree.root_node(), source))
            }
            _ => structural_fallback(Language::TypeScript, source, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fidelity;

    fn extract(source: &str) -> Extraction {
        TypeScriptExtractor.extract(source, Path::new("src/app.ts"))
    }

    #[test]
    fn extracts_typed_function() {
        let source = "/** Greets a user. */\nexport function greet(name: string): string {\n    return format(name);\n}\n";
        let ex = extract(source);

        assert_eq!(ex.fidelity, Fidelity::Structural);
        let func = &ex.symbols.functions[0];
        assert_eq!(func.name, "greet");
        assert_eq!(func.params[0].type_name.as_deref(), Some("string"));
        assert_eq!(func.return_type.as_deref(), Some("string"));
        assert_eq!(func.docstring.as_deref(), Some("Greets a user."));
        assert_eq!(func.calls, vec!["format"]);
        assert_eq!(ex.symbols.exports, vec!["greet"]);
    }

    #[test]
    fn extracts_class_with_heritage_and_fields() {
        let source = "class Service extends Base implements Runnable {\n    retries: number = 3;\n\n    start(): void {\n        this.connect();\n    }\n}\n";
        let ex = extract(source);

        let ty = &ex.symbols.types[0];
        assert_eq!(ty.name, "Service");
        assert!(ty.supertypes.contains(&"Base".to_string()));
        assert!(ty.supertypes.contains(&"Runnable".to_string()));
        assert_eq!(ty.attributes[0].name, "retries");
        assert_eq!(ty.methods[0].name, "start");
        assert_eq!(ty.methods[0].calls, vec!["connect"]);
    }

    #[test]
    fn extracts_interface_members() {
        let source = "interface Store {\n    capacity: number;\n    put(key: string): void;\n}\n";
        let ex = extract(source);

        let ty = &ex.symbols.types[0];
        assert_eq!(ty.name, "Store");
        assert_eq!(ty.attributes[0].name, "capacity");
        assert_eq!(ty.methods[0].name, "put");
    }

    #[test]
    fn arrow_function_binding_is_a_function() {
        let source = "const handler = (req: Request) => {\n    dispatch(req);\n};\nconst LIMIT = 10;\n";
        let ex = extract(source);

        assert_eq!(ex.symbols.functions[0].name, "handler");
        assert_eq!(ex.symbols.functions[0].calls, vec!["dispatch"]);
        assert_eq!(ex.symbols.variables[0].name, "LIMIT");
        assert_eq!(ex.symbols.variables[0].value.as_deref(), Some("10"));
    }

    #[test]
    fn extracts_import_sources() {
        let source = "import { Router } from './router';\nimport express from 'express';\n";
        let ex = extract(source);

        let targets: Vec<_> = ex.symbols.imports.iter().map(|i| i.target.as_str()).collect();
        assert_eq!(targets, vec!["./router", "express"]);
    }
}
