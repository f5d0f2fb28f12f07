use tree_sitter::Node;

use crate::LineSpan;

/// Parse source with the given grammar. `None` when the parser cannot be
/// configured or bails out entirely.
pub fn parse(source: &str, language: &tree_sitter::Language) -> Option<tree_sitter::Tree> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(language).ok()?;
    parser.parse(source, None)
}

/// Extract the source text for a tree-sitter node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find a child by field name.
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Find the first child with a specific kind.
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| child.kind() == kind)
}

/// Convert a tree-sitter node to a 1-based inclusive line span.
pub fn line_span(node: Node<'_>) -> LineSpan {
    LineSpan {
        start: node.start_position().row + 1,
        end: node.end_position().row + 1,
    }
}

/// Last path segment of a possibly qualified reference
/// (`foo::bar::baz`, `obj.method`, `pkg.Class`).
pub fn trailing_name(reference: &str) -> &str {
    reference
        .rsplit("::")
        .next()
        .and_then(|s| s.rsplit('.').next())
        .unwrap_or(reference)
        .trim()
}

/// Collect line doc comments (`///`, `//`, `#`) immediately above a node.
pub fn doc_lines_above(node: Node<'_>, source: &str, prefix: &str) -> Option<String> {
    let mut comments = Vec::new();
    let mut current = node;

    while let Some(prev) = current.prev_sibling() {
        if prev.kind() == "line_comment" || prev.kind() == "comment" {
            let text = node_text(prev, source);
            if text.starts_with(prefix) {
                let stripped = text.strip_prefix(prefix).unwrap_or(text).trim();
                comments.push(stripped.to_string());
                current = prev;
                continue;
            }
        }
        break;
    }

    if comments.is_empty() {
        return None;
    }

    // Collected bottom-to-top
    comments.reverse();
    Some(comments.join("\n"))
}

/// Extract a block doc comment (`/** ... */`) from the preceding sibling.
pub fn block_doc_above(node: Node<'_>, source: &str) -> Option<String> {
    let prev = node.prev_sibling()?;
    if prev.kind() != "comment" && prev.kind() != "block_comment" {
        return None;
    }

    let text = node_text(prev, source);
    if !text.starts_with("/**") {
        return None;
    }

    let inner = text
        .strip_prefix("/**")
        .unwrap_or(text)
        .strip_suffix("*/")
        .unwrap_or(text)
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("* ")
                .or(trimmed.strip_prefix('*'))
                .unwrap_or(trimmed)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if inner.is_empty() { None } else { Some(inner) }
}

/// Capture an initializer value if it is a simple literal of one of the
/// given node kinds; complex expressions stay unknown.
pub fn simple_literal(node: Node<'_>, source: &str, kinds: &[&str]) -> Option<String> {
    if kinds.contains(&node.kind()) {
        Some(node_text(node, source).to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_name_strips_qualifiers() {
        assert_eq!(trailing_name("foo"), "foo");
        assert_eq!(trailing_name("self.helper"), "helper");
        assert_eq!(trailing_name("crate::store::open"), "open");
        assert_eq!(trailing_name("pkg.mod.Cls"), "Cls");
    }
}
