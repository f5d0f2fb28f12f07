//! Graph serializer: a pure function of the in-memory model.
//!
//! Collections are already held in deterministic order, so serializing an
//! unchanged model is byte-identical — downstream consumers rely on this
//! for diffing and caching. The only I/O here is the thin [`write_to`]
//! wrapper.

use std::path::Path;

use crate::error::Result;
use crate::model::CodeGraph;

/// Serialize the graph to pretty-printed JSON bytes (UTF-8).
pub fn to_json_bytes(graph: &CodeGraph) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(graph)?)
}

/// Serialize the graph to a pretty-printed JSON string.
pub fn to_json_string(graph: &CodeGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

/// Serialize and write the graph to a file in one step.
pub fn write_to(graph: &CodeGraph, path: &Path) -> Result<()> {
    let bytes = to_json_bytes(graph)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_graph() -> CodeGraph {
        CodeGraph {
            name: "demo".to_string(),
            packages: Vec::new(),
            language: "rust".to_string(),
            total_files: 0,
            total_functions: 0,
            total_classes: 0,
            total_variables: 0,
        }
    }

    #[test]
    fn reserializing_unchanged_model_is_byte_identical() {
        let graph = tiny_graph();
        assert_eq!(to_json_bytes(&graph).unwrap(), to_json_bytes(&graph).unwrap());
    }

    #[test]
    fn top_level_field_order_is_stable() {
        let json = to_json_string(&tiny_graph()).unwrap();
        let name_pos = json.find("\"name\"").unwrap();
        let packages_pos = json.find("\"packages\"").unwrap();
        let language_pos = json.find("\"language\"").unwrap();
        let files_pos = json.find("\"total_files\"").unwrap();
        assert!(name_pos < packages_pos);
        assert!(packages_pos < language_pos);
        assert!(language_pos < files_pos);
    }

    #[test]
    fn round_trips_through_json() {
        let graph = tiny_graph();
        let json = to_json_string(&graph).unwrap();
        let back: CodeGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }
}
