//! Unified graph model: repository → packages → files → symbols.
//!
//! Every collection is an ordered `Vec` populated in a deterministic order
//! (declaration order within a file, lexical order across files/packages),
//! so serializing an unchanged model is byte-identical across runs. Nothing
//! here is mutated once serialization begins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cartograph_languages::Fidelity;

// ── Symbol identity ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Type,
    Variable,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Type => "type",
            Self::Variable => "variable",
        }
    }
}

/// Stable symbol identifier: `(file path, kind, name, start line)`.
///
/// Rendered as `path::kind::name@line`, which is stable across runs on
/// unchanged input and unique within the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    pub file: String,
    pub kind: SymbolKind,
    pub name: String,
    pub line: usize,
}

impl SymbolId {
    pub fn new(file: &str, kind: SymbolKind, name: &str, line: usize) -> Self {
        Self {
            file: file.to_string(),
            kind,
            name: name.to_string(),
            line,
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}@{}",
            self.file,
            self.kind.as_str(),
            self.name,
            self.line
        )
    }
}

impl FromStr for SymbolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, line) = s
            .rsplit_once('@')
            .ok_or_else(|| format!("missing line in symbol id: {s}"))?;
        let line: usize = line.parse().map_err(|_| format!("bad line in: {s}"))?;
        let (rest, name) = rest
            .rsplit_once("::")
            .ok_or_else(|| format!("missing name in symbol id: {s}"))?;
        let (file, kind) = rest
            .rsplit_once("::")
            .ok_or_else(|| format!("missing kind in symbol id: {s}"))?;
        let kind = match kind {
            "function" => SymbolKind::Function,
            "type" => SymbolKind::Type,
            "variable" => SymbolKind::Variable,
            other => return Err(format!("unknown symbol kind: {other}")),
        };
        Ok(Self::new(file, kind, name, line))
    }
}

impl Serialize for SymbolId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SymbolId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Dependency edges ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Import,
    Call,
    Inherits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Resolved,
    Unresolved,
    Ambiguous,
}

/// What a reference was bound to: a declared symbol, or (for imports that
/// match a module path) a whole file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolvedTarget {
    Symbol(SymbolId),
    File(String),
}

impl ResolvedTarget {
    /// Repository-relative path of the file the target lives in.
    pub fn file(&self) -> &str {
        match self {
            Self::Symbol(id) => &id.file,
            Self::File(path) => path,
        }
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(id) => id.fmt(f),
            Self::File(path) => f.write_str(path),
        }
    }
}

impl Serialize for ResolvedTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResolvedTarget {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse::<SymbolId>()
            .map_or_else(|_| Self::File(s), Self::Symbol))
    }
}

/// A dependency edge annotated with its resolution outcome. References are
/// by-name until resolved; an edge that cannot be bound stays in the list
/// tagged unresolved or ambiguous — it is never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedDependency {
    /// Target as written in source.
    pub name: String,
    pub kind: DependencyKind,
    /// Symbol the reference originates from; `None` for file-level imports.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<SymbolId>,
    pub status: ResolutionStatus,
    /// Bound target when resolution succeeded unambiguously.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<ResolvedTarget>,
    /// Equally plausible targets of an ambiguous reference.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub candidates: Vec<ResolvedTarget>,
    pub fidelity: Fidelity,
}

// ── Symbols ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub id: SymbolId,
    pub file_name: String,
    pub start_line: usize,
    pub length: usize,
    pub parameters: Vec<ParamInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub docstring: Option<String>,
    /// Names this function calls; matching edges live in the file's
    /// `detailed_dependencies`.
    pub calls_to: Vec<String>,
    /// Files containing at least one resolved or ambiguous edge targeting
    /// this function. Filled by the resolver, empty until then.
    pub referenced_in: Vec<String>,
    pub confidence: Fidelity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub id: SymbolId,
    pub file_name: String,
    pub start_line: usize,
    pub length: usize,
    /// Declared supertype names — inheritance is 0..N references, never a
    /// single-parent slot.
    pub supertypes: Vec<String>,
    pub methods: Vec<FunctionInfo>,
    pub attributes: Vec<AttributeInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub docstring: Option<String>,
    pub referenced_in: Vec<String>,
    pub confidence: Fidelity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Global,
    Class,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub id: SymbolId,
    pub file_name: String,
    pub start_line: usize,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub type_name: Option<String>,
    /// Simple literal initializers only; complex expressions stay `None`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    pub scope: VariableScope,
    pub confidence: Fidelity,
}

// ── Files and packages ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Repository-relative path — the file's unique key.
    pub path: String,
    pub language: String,
    pub functions: Vec<FunctionInfo>,
    pub types: Vec<TypeInfo>,
    pub variables: Vec<VariableInfo>,
    /// Import targets as written in source.
    pub dependencies: Vec<String>,
    pub exports: Vec<String>,
    pub detailed_dependencies: Vec<DetailedDependency>,
    pub fidelity: Fidelity,
}

impl FileInfo {
    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Aggregated cross-package dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageEdge {
    pub target: String,
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub files: Vec<FileInfo>,
    /// Union of the owned files' import targets.
    pub dependencies: Vec<String>,
    /// Union of the owned files' exported names.
    pub exports: Vec<String>,
    /// Resolved edges whose source and target files live in different
    /// packages, deduplicated by (target, kind).
    pub edges: Vec<PackageEdge>,
}

/// Complete code graph for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGraph {
    pub name: String,
    pub packages: Vec<PackageInfo>,
    pub language: String,
    pub total_files: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    pub total_variables: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_round_trips_through_display() {
        let id = SymbolId::new("src/app/util.py", SymbolKind::Function, "fetch", 12);
        let rendered = id.to_string();
        assert_eq!(rendered, "src/app/util.py::function::fetch@12");
        assert_eq!(rendered.parse::<SymbolId>().unwrap(), id);
    }

    #[test]
    fn symbol_id_serializes_as_string() {
        let id = SymbolId::new("a.rs", SymbolKind::Type, "Point", 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a.rs::type::Point@3\"");
    }

    #[test]
    fn resolved_target_distinguishes_files_from_symbols() {
        let sym: ResolvedTarget = serde_json::from_str("\"a.rs::function::run@1\"").unwrap();
        assert!(matches!(sym, ResolvedTarget::Symbol(_)));
        let file: ResolvedTarget = serde_json::from_str("\"src/util.rs\"").unwrap();
        assert!(matches!(file, ResolvedTarget::File(_)));
        assert_eq!(sym.file(), "a.rs");
        assert_eq!(file.file(), "src/util.rs");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn symbol_id_display_parse_round_trip(
                dirs in prop::collection::vec("[a-z][a-z0-9_]{0,7}", 1..4),
                name in "[A-Za-z_][A-Za-z0-9_]{0,11}",
                line in 1usize..100_000,
            ) {
                let file = format!("{}.py", dirs.join("/"));
                for kind in [SymbolKind::Function, SymbolKind::Type, SymbolKind::Variable] {
                    let id = SymbolId::new(&file, kind, &name, line);
                    let parsed: SymbolId = id.to_string().parse().unwrap();
                    prop_assert_eq!(&parsed, &id);
                }
            }
        }
    }

    #[test]
    fn detailed_dependency_omits_empty_fields() {
        let edge = DetailedDependency {
            name: "helper".to_string(),
            kind: DependencyKind::Call,
            source: None,
            status: ResolutionStatus::Unresolved,
            target: None,
            candidates: Vec::new(),
            fidelity: Fidelity::Heuristic,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert!(json.get("target").is_none());
        assert!(json.get("candidates").is_none());
        assert_eq!(json["status"], "unresolved");
    }
}
