use std::path::Path;

use crate::classify::Language;
use crate::Extraction;

use super::helpers::parse;
use super::{ecma, structural_fallback, Extractor};

#[derive(Debug)]
pub struct JavaScriptExtractor;

impl Extractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn extract(&self, source: &str, path: &Path) -> Extraction {
        match parse(source, &tree_sitter_javascript::LANGUAGE.into()) {
            Some(tree) if !tree.root_node().has_error() => {
                Extraction::structural(ecma::collect(tree.root_node(), source))
            }
            _ => structural_fallback(Language::JavaScript, source, path),
        }
    }
}
