//! Pattern-rule extraction for languages without a structural grammar, and
//! the fallback path when a structural parse fails.
//!
//! Rules are ordered per construct family and explicitly lossy: a rule that
//! fails to match omits the record, and a function-looking pattern inside a
//! string is accepted as a false positive rather than an error. Precision is
//! traded for availability; the heuristic fidelity tag records the trade.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::classify::Language;
use crate::{Extraction, LineSpan, RawFunction, RawImport, RawSymbols, RawType};

use super::Extractor;

/// Extractor backed by per-family pattern rule tables.
#[derive(Debug)]
pub struct HeuristicExtractor {
    language: Language,
}

impl HeuristicExtractor {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl Extractor for HeuristicExtractor {
    fn language(&self) -> Language {
        self.language
    }

    fn extract(&self, source: &str, _path: &Path) -> Extraction {
        Extraction::heuristic(pattern_extract(self.language, source))
    }
}

/// Run the rule table for a language family over raw text.
///
/// Also serves as the degradation path for structural extractors whose
/// parse tree came back broken.
pub fn pattern_extract(language: Language, source: &str) -> RawSymbols {
    let rules = rules_for(language);
    let mut symbols = RawSymbols::default();

    for rule in rules.functions {
        for caps in rule.captures_iter(source) {
            let Some(name) = caps.get(1) else { continue };
            if rules.skip_keywords.contains(&name.as_str()) {
                continue;
            }
            let start = line_of(source, name.start());
            let span = if rules.brace_bodies {
                LineSpan {
                    start,
                    end: brace_end_line(source, caps.get(0).map_or(name.end(), |m| m.end()))
                        .unwrap_or(start),
                }
            } else {
                LineSpan::single(start)
            };
            symbols.functions.push(RawFunction {
                name: name.as_str().to_string(),
                span,
                ..RawFunction::default()
            });
            symbols.exports.push(name.as_str().to_string());
        }
    }

    for rule in rules.types {
        for caps in rule.captures_iter(source) {
            let Some(name) = caps.get(1) else { continue };
            symbols.types.push(RawType {
                name: name.as_str().to_string(),
                span: LineSpan::single(line_of(source, name.start())),
                ..RawType::default()
            });
            symbols.exports.push(name.as_str().to_string());
        }
    }

    for rule in rules.imports {
        for caps in rule.captures_iter(source) {
            let Some(target) = caps.get(1) else { continue };
            symbols.imports.push(RawImport {
                target: target.as_str().trim().to_string(),
                line: line_of(source, target.start()),
            });
        }
    }

    symbols
}

// ── Rule tables ────────────────────────────────────────────────────

struct RuleSet {
    functions: &'static LazyLock<Vec<Regex>>,
    types: &'static LazyLock<Vec<Regex>>,
    imports: &'static LazyLock<Vec<Regex>>,
    /// Function bodies delimited by braces — span found by brace matching.
    brace_bodies: bool,
    /// Names the function pattern can accidentally capture.
    skip_keywords: &'static [&'static str],
}

macro_rules! rules {
    ($name:ident, $($pattern:expr),+ $(,)?) => {
        static $name: LazyLock<Vec<Regex>> = LazyLock::new(|| {
            vec![$(Regex::new($pattern).unwrap()),+]
        });
    };
}

// C family — mirrors include/class/function scanning for .c/.h/.cpp files.
rules!(C_FUNCTIONS, r"(?m)^[ \t]*(?:[\w:<>,&*]+\s+)+(\w+)\s*\([^;)]*\)\s*\{");
rules!(C_TYPES, r"(?m)\b(?:class|struct)\s+(\w+)\s*[:{]");
rules!(C_IMPORTS, r#"(?m)^\s*#include\s*[<"]([^>"]+)[>"]"#);

rules!(
    RUBY_FUNCTIONS,
    r"(?m)^\s*def\s+(?:self\.)?([a-z_]\w*[?!=]?)"
);
rules!(RUBY_TYPES, r"(?m)^\s*(?:class|module)\s+([A-Z]\w*)");
rules!(
    RUBY_IMPORTS,
    r#"(?m)^\s*require(?:_relative)?\s+['"]([^'"]+)['"]"#
);

rules!(
    SHELL_FUNCTIONS,
    r"(?m)^\s*(?:function\s+)?([A-Za-z_]\w*)\s*\(\)\s*\{",
    r"(?m)^\s*function\s+([A-Za-z_]\w*)\s*\{"
);
rules!(SHELL_IMPORTS, r"(?m)^\s*(?:source|\.)\s+(\S+)");

rules!(
    RUST_FUNCTIONS,
    r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:const\s+)?(?:unsafe\s+)?fn\s+(\w+)"
);
rules!(
    RUST_TYPES,
    r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+(\w+)"
);
rules!(RUST_IMPORTS, r"(?m)^\s*use\s+([^;]+);");

rules!(PY_FUNCTIONS, r"(?m)^\s*(?:async\s+)?def\s+(\w+)");
rules!(PY_TYPES, r"(?m)^\s*class\s+(\w+)");
rules!(
    PY_IMPORTS,
    r"(?m)^\s*import\s+([\w.]+)",
    r"(?m)^\s*from\s+([\w.]+)\s+import"
);

rules!(ECMA_FUNCTIONS, r"(?m)\bfunction\s+(\w+)\s*\(");
rules!(ECMA_TYPES, r"(?m)\bclass\s+(\w+)");
rules!(
    ECMA_IMPORTS,
    r#"(?m)import\s+[^'"]*?from\s+['"]([^'"]+)['"]"#,
    r#"(?m)import\s+['"]([^'"]+)['"]"#,
    r#"require\(['"]([^'"]+)['"]\)"#
);

rules!(
    GO_FUNCTIONS,
    r"(?m)^func\s+(?:\([^)]*\)\s*)?(\w+)\s*\("
);
rules!(GO_TYPES, r"(?m)^type\s+(\w+)\s+(?:struct|interface)");
rules!(
    GO_IMPORTS,
    r#"(?m)^import\s+(?:\w+\s+)?"([^"]+)""#,
    r#"(?m)^\t(?:\w+\s+)?"([^"]+)"$"#
);

rules!(
    JAVA_FUNCTIONS,
    r"(?m)^\s*(?:public\s+|private\s+|protected\s+)?(?:static\s+)?(?:final\s+)?[\w<>,\[\]]+\s+(\w+)\s*\([^)]*\)\s*\{"
);
rules!(
    JAVA_TYPES,
    r"(?m)(?:public\s+|private\s+|protected\s+)?(?:abstract\s+|final\s+)?(?:class|interface|enum)\s+(\w+)"
);
rules!(JAVA_IMPORTS, r"(?m)^\s*import\s+(?:static\s+)?([\w.*]+)\s*;");

// Generic import-like lines for unclassified textual files.
rules!(
    GENERIC_IMPORTS,
    r#"(?m)^\s*(?:import|include|require|use|from|source)\b\s*[('"<]?\s*([\w./:@-]+)"#
);

static NO_RULES: &[LazyLock<Regex>] = &[];

const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "return", "catch", "sizeof"];

fn rules_for(language: Language) -> RuleSet {
    match language {
        Language::C | Language::Cpp => RuleSet {
            functions: C_FUNCTIONS,
            types: C_TYPES,
            imports: C_IMPORTS,
            brace_bodies: true,
            skip_keywords: CONTROL_KEYWORDS,
        },
        Language::Ruby => RuleSet {
            functions: RUBY_FUNCTIONS,
            types: RUBY_TYPES,
            imports: RUBY_IMPORTS,
            brace_bodies: false,
            skip_keywords: &[],
        },
        Language::Shell => RuleSet {
            functions: SHELL_FUNCTIONS,
            types: NO_RULES,
            imports: SHELL_IMPORTS,
            brace_bodies: true,
            skip_keywords: &[],
        },
        Language::Rust => RuleSet {
            functions: RUST_FUNCTIONS,
            types: RUST_TYPES,
            imports: RUST_IMPORTS,
            brace_bodies: false,
            skip_keywords: &[],
        },
        Language::Python => RuleSet {
            functions: PY_FUNCTIONS,
            types: PY_TYPES,
            imports: PY_IMPORTS,
            brace_bodies: false,
            skip_keywords: &[],
        },
        Language::TypeScript | Language::JavaScript => RuleSet {
            functions: ECMA_FUNCTIONS,
            types: ECMA_TYPES,
            imports: ECMA_IMPORTS,
            brace_bodies: true,
            skip_keywords: CONTROL_KEYWORDS,
        },
        Language::Go => RuleSet {
            functions: GO_FUNCTIONS,
            types: GO_TYPES,
            imports: GO_IMPORTS,
            brace_bodies: true,
            skip_keywords: &[],
        },
        Language::Java => RuleSet {
            functions: JAVA_FUNCTIONS,
            types: JAVA_TYPES,
            imports: JAVA_IMPORTS,
            brace_bodies: true,
            skip_keywords: CONTROL_KEYWORDS,
        },
        Language::Unknown => RuleSet {
            functions: NO_RULES,
            types: NO_RULES,
            imports: GENERIC_IMPORTS,
            brace_bodies: false,
            skip_keywords: &[],
        },
    }
}

// ── Span helpers ───────────────────────────────────────────────────

fn line_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}

/// Walk forward from a match end counting braces to find the body's closing
/// line. Brace characters inside strings are miscounted; accepted as part of
/// the heuristic trade.
fn brace_end_line(source: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut entered = false;
    for (offset, ch) in source[from.saturating_sub(1)..].char_indices() {
        match ch {
            '{' => {
                depth += 1;
                entered = true;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if entered && depth == 0 {
                    return Some(line_of(source, from.saturating_sub(1) + offset));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_c_functions_and_includes() {
        let source = "#include <stdio.h>\n#include \"util.h\"\n\nint add(int a, int b) {\n    return a + b;\n}\n";
        let symbols = pattern_extract(Language::C, source);

        assert_eq!(symbols.functions.len(), 1);
        assert_eq!(symbols.functions[0].name, "add");
        assert_eq!(symbols.functions[0].span.start, 4);
        assert_eq!(symbols.functions[0].span.end, 6);
        assert_eq!(symbols.imports.len(), 2);
        assert_eq!(symbols.imports[0].target, "stdio.h");
    }

    #[test]
    fn skips_control_flow_keywords() {
        let source = "void run(void) {\n    if (x) {\n    }\n    while (y) {\n    }\n}\n";
        let symbols = pattern_extract(Language::C, source);
        let names: Vec<_> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["run"]);
    }

    #[test]
    fn extracts_ruby_defs_and_requires() {
        let source = "require 'json'\nrequire_relative 'lib/util'\n\nclass Parser\n  def parse!\n  end\nend\n\ndef self.main\nend\n";
        let symbols = pattern_extract(Language::Ruby, source);

        let fns: Vec<_> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fns, vec!["parse!", "main"]);
        assert_eq!(symbols.types[0].name, "Parser");
        assert_eq!(symbols.imports.len(), 2);
    }

    #[test]
    fn extracts_shell_functions_and_sources() {
        let source = "#!/bin/bash\nsource ./env.sh\n\ndeploy() {\n    echo deploying\n}\n\nfunction cleanup {\n    rm -rf tmp\n}\n";
        let symbols = pattern_extract(Language::Shell, source);

        let fns: Vec<_> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(fns.contains(&"deploy"));
        assert!(fns.contains(&"cleanup"));
        assert_eq!(symbols.imports[0].target, "./env.sh");
    }

    #[test]
    fn rust_fallback_rules_cover_items() {
        let source = "use std::fmt;\n\npub struct Point;\n\npub fn origin() -> Point {\n    Point\n}\n";
        let symbols = pattern_extract(Language::Rust, source);

        assert_eq!(symbols.functions[0].name, "origin");
        assert_eq!(symbols.types[0].name, "Point");
        assert_eq!(symbols.imports[0].target, "std::fmt");
    }

    #[test]
    fn generic_scan_only_finds_import_like_lines() {
        let source = "import something.core\nThis is prose, not code.\n";
        let symbols = pattern_extract(Language::Unknown, source);

        assert!(symbols.functions.is_empty());
        assert_eq!(symbols.imports.len(), 1);
        assert_eq!(symbols.imports[0].target, "something.core");
    }

    #[test]
    fn false_positive_in_string_is_kept() {
        // A function-looking pattern inside a string literal still matches;
        // the record is kept and tagged heuristic rather than dropped.
        let source = "const DOC = \"function bogus() {}\";\nfunction real() {\n}\n";
        let symbols = pattern_extract(Language::JavaScript, source);

        let names: Vec<_> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"bogus"));
        assert!(names.contains(&"real"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Rule mismatches must degrade to fewer records, never to a
            // panic or an empty-named record, whatever bytes come in.
            #[test]
            fn arbitrary_text_never_breaks_pattern_rules(
                chars in prop::collection::vec(any::<char>(), 0..300),
            ) {
                let source: String = chars.into_iter().collect();
                for language in [
                    Language::C,
                    Language::Cpp,
                    Language::Ruby,
                    Language::Shell,
                    Language::Rust,
                    Language::Python,
                    Language::JavaScript,
                    Language::Go,
                    Language::Java,
                    Language::Unknown,
                ] {
                    let symbols = pattern_extract(language, &source);
                    for func in &symbols.functions {
                        prop_assert!(!func.name.is_empty());
                        prop_assert!(func.span.end >= func.span.start);
                    }
                    for ty in &symbols.types {
                        prop_assert!(!ty.name.is_empty());
                    }
                }
            }
        }
    }
}
