mod ecma;
pub mod go;
mod helpers;
pub mod heuristic;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::classify::Language;
use crate::Extraction;

/// Capability trait implemented by each language family's extraction support.
///
/// Extraction never fails: structural implementations fall back to pattern
/// rules when the parse tree is broken, and pattern rules simply omit
/// records they cannot match.
pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// Classifier tag this implementation handles.
    fn language(&self) -> Language;

    /// Extract raw symbol records from file text.
    fn extract(&self, source: &str, path: &Path) -> Extraction;
}

/// Lookup table from classifier output to extractor — a closed set of
/// variants, populated once at startup.
#[derive(Debug)]
pub struct ExtractorRegistry {
    table: HashMap<Language, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            table: HashMap::new(),
        };
        reg.register(Arc::new(rust::RustExtractor));
        reg.register(Arc::new(python::PythonExtractor));
        reg.register(Arc::new(typescript::TypeScriptExtractor));
        reg.register(Arc::new(javascript::JavaScriptExtractor));
        reg.register(Arc::new(go::GoExtractor));
        reg.register(Arc::new(java::JavaExtractor));
        // Pattern-rule-only language families
        reg.register(Arc::new(heuristic::HeuristicExtractor::new(Language::C)));
        reg.register(Arc::new(heuristic::HeuristicExtractor::new(Language::Cpp)));
        reg.register(Arc::new(heuristic::HeuristicExtractor::new(Language::Ruby)));
        reg.register(Arc::new(heuristic::HeuristicExtractor::new(Language::Shell)));
        // Unknown files get a generic import-only scan
        reg.register(Arc::new(heuristic::HeuristicExtractor::new(
            Language::Unknown,
        )));
        reg
    }

    fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.table.insert(extractor.language(), extractor);
    }

    /// Look up the extractor for a classified language.
    pub fn for_language(&self, language: Language) -> Option<Arc<dyn Extractor>> {
        self.table.get(&language).cloned()
    }

    /// All registered language tags.
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<_> = self.table.keys().copied().collect();
        langs.sort();
        langs
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Degradation path shared by the structural extractors: when the parse tree
/// is broken or the parser bails, re-run the file through the language's
/// pattern rules and note the downgrade.
pub(crate) fn structural_fallback(language: Language, source: &str, path: &Path) -> Extraction {
    tracing::debug!(path = %path.display(), language = %language, "structural parse failed, using pattern rules");
    let mut extraction = Extraction::heuristic(heuristic::pattern_extract(language, source));
    extraction.notes.push(format!(
        "structural parse failed for {}; extracted with pattern rules",
        path.display()
    ));
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_classifier_tag() {
        let reg = ExtractorRegistry::new();
        for lang in [
            Language::Rust,
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::Go,
            Language::Java,
            Language::C,
            Language::Cpp,
            Language::Ruby,
            Language::Shell,
            Language::Unknown,
        ] {
            assert!(
                reg.for_language(lang).is_some(),
                "no extractor registered for {lang}"
            );
        }
    }

    #[test]
    fn registry_maps_tag_to_matching_extractor() {
        let reg = ExtractorRegistry::new();
        let rust = reg.for_language(Language::Rust).unwrap();
        assert_eq!(rust.language(), Language::Rust);
    }
}
