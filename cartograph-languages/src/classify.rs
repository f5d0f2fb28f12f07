use std::path::Path;

use serde::{Deserialize, Serialize};

/// Closed set of languages the pipeline knows about.
///
/// The first six have structural (tree-sitter) extractors; the rest are
/// handled by pattern rules. `Unknown` files are counted but only scanned
/// for generic import-like lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Go,
    Java,
    C,
    Cpp,
    Ruby,
    Shell,
    Unknown,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Go => "go",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Ruby => "ruby",
            Self::Shell => "shell",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a file to a language tag. Never fails.
///
/// Extension mapping wins; when the extension is absent or ambiguous
/// (`.h` headers), an optional content sample breaks the tie via shebang
/// lines and keyword sniffing. Unmapped files come back as
/// [`Language::Unknown`].
pub fn classify(path: &Path, content: Option<&str>) -> Language {
    let ext = path.extension().and_then(|e| e.to_str());

    match ext {
        Some("rs") => Language::Rust,
        Some("py" | "pyi") => Language::Python,
        Some("ts" | "tsx") => Language::TypeScript,
        Some("js" | "jsx" | "mjs" | "cjs") => Language::JavaScript,
        Some("go") => Language::Go,
        Some("java") => Language::Java,
        Some("c") => Language::C,
        // Headers are shared between C and C++ — sniff the content.
        Some("h") => content.map_or(Language::C, |text| {
            if looks_like_cpp(text) {
                Language::Cpp
            } else {
                Language::C
            }
        }),
        Some("cpp" | "cc" | "cxx" | "hpp" | "hh") => Language::Cpp,
        Some("rb") => Language::Ruby,
        Some("sh" | "bash") => Language::Shell,
        Some(_) => Language::Unknown,
        None => content.map_or(Language::Unknown, sniff_content),
    }
}

fn looks_like_cpp(text: &str) -> bool {
    ["class ", "template<", "template <", "namespace ", "::"]
        .iter()
        .any(|kw| text.contains(kw))
}

/// Best-effort sniff for extensionless files: shebang first, then a crude
/// keyword census over the first lines.
fn sniff_content(text: &str) -> Language {
    if let Some(first) = text.lines().next() {
        if let Some(interp) = first.strip_prefix("#!") {
            if interp.contains("python") {
                return Language::Python;
            }
            if interp.contains("node") {
                return Language::JavaScript;
            }
            if interp.contains("ruby") {
                return Language::Ruby;
            }
            if interp.contains("bash") || interp.contains("/sh") || interp.ends_with("sh") {
                return Language::Shell;
            }
        }
    }

    let head: String = text.lines().take(50).collect::<Vec<_>>().join("\n");
    let score = |keywords: &[&str]| -> usize {
        keywords.iter().map(|kw| head.matches(kw).count()).sum()
    };

    let candidates = [
        (Language::Rust, score(&["fn ", "let ", "impl ", "pub "])),
        (Language::Python, score(&["def ", "import ", "self."])),
        (Language::Go, score(&["func ", "package ", ":="])),
        (Language::Shell, score(&["echo ", "fi\n", "esac"])),
    ];

    candidates
        .into_iter()
        .filter(|(_, score)| *score >= 2)
        .max_by_key(|(_, score)| *score)
        .map_or(Language::Unknown, |(lang, _)| lang)
}
