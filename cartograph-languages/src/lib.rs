pub mod classify;
pub mod languages;

use serde::{Deserialize, Serialize};

pub use classify::Language;
pub use languages::{Extractor, ExtractorRegistry};

// ── Extraction fidelity ────────────────────────────────────────────

/// How a file's symbols were obtained.
///
/// Structural extraction walks a parsed syntax tree; heuristic extraction
/// runs ordered pattern rules over raw text and is lossy by design. The tag
/// is carried on every record through to serialization so consumers can
/// weigh confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fidelity {
    Structural,
    Heuristic,
}

// ── Span type ──────────────────────────────────────────────────────

/// Inclusive 1-based line span of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of source lines the declaration covers.
    pub fn line_count(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }
}

impl Default for LineSpan {
    fn default() -> Self {
        Self::single(1)
    }
}

// ── Raw symbol records ─────────────────────────────────────────────
//
// Both extraction fidelities emit these shapes, so the normalizer has no
// language-specific logic.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParam {
    pub name: String,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawFunction {
    pub name: String,
    pub span: LineSpan,
    pub params: Vec<RawParam>,
    pub return_type: Option<String>,
    pub docstring: Option<String>,
    /// Names referenced at call sites inside the body (possibly unresolved).
    pub calls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAttribute {
    pub name: String,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawType {
    pub name: String,
    pub span: LineSpan,
    /// Declared supertype names (0..N — extends/implements/trait impls).
    pub supertypes: Vec<String>,
    pub methods: Vec<RawFunction>,
    pub attributes: Vec<RawAttribute>,
    pub docstring: Option<String>,
}

/// Scope a variable was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawScope {
    File,
    Function(String),
    Type(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVariable {
    pub name: String,
    pub line: usize,
    pub type_name: Option<String>,
    /// Only simple literals are captured; complex initializers stay `None`.
    pub value: Option<String>,
    pub scope: RawScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImport {
    /// Import target as written in source (module path, header, crate path).
    pub target: String,
    pub line: usize,
}

/// One extractor's output for a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSymbols {
    pub functions: Vec<RawFunction>,
    pub types: Vec<RawType>,
    pub variables: Vec<RawVariable>,
    pub imports: Vec<RawImport>,
    /// Names of symbols the file makes visible to the rest of the repository.
    pub exports: Vec<String>,
}

/// Extraction result: records plus the fidelity that produced them and any
/// per-file notes (e.g. a structural parse falling back to pattern rules).
/// Extraction never fails — a rule that does not match simply omits records.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub symbols: RawSymbols,
    pub fidelity: Fidelity,
    pub notes: Vec<String>,
}

impl Extraction {
    pub fn structural(symbols: RawSymbols) -> Self {
        Self {
            symbols,
            fidelity: Fidelity::Structural,
            notes: Vec::new(),
        }
    }

    pub fn heuristic(symbols: RawSymbols) -> Self {
        Self {
            symbols,
            fidelity: Fidelity::Heuristic,
            notes: Vec::new(),
        }
    }
}
