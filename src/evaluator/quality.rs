// src/evaluator/quality.rs — Static quality metrics for generated Python

use serde::Serialize;
use tree_sitter::Node;

use super::syntax;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityMetrics {
    pub loc: u32,
    pub cyclomatic_complexity: u32,
    pub has_imports: bool,
    pub has_docstring: bool,
    pub syntax_valid: bool,
    pub num_functions: u32,
}

/// Analyze source code. Code that does not parse yields all-zero metrics
/// with `syntax_valid = false`.
pub fn analyze(code: &str) -> QualityMetrics {
    let Some(tree) = syntax::parse_valid(code) else {
        return QualityMetrics::default();
    };

    let mut metrics = QualityMetrics {
        loc: count_loc(code),
        cyclomatic_complexity: 1,
        syntax_valid: true,
        ..Default::default()
    };

    syntax::visit(&tree, |node| match node.kind() {
        // `async for` and `async def` are separate node types to the interpreter
        "for_statement" | "function_definition" if is_async(node) => {}
        "if_statement" | "elif_clause" | "for_statement" | "while_statement" | "except_clause"
        | "except_group_clause" => metrics.cyclomatic_complexity += 1,
        // Binary in the grammar: `a and b and c` is two nodes.
        "boolean_operator" => metrics.cyclomatic_complexity += 1,
        "import_statement" | "import_from_statement" | "future_import_statement" => {
            metrics.has_imports = true
        }
        "function_definition" => {
            metrics.num_functions += 1;
            if has_docstring(node, code) {
                metrics.has_docstring = true;
            }
        }
        _ => {}
    });

    metrics
}

/// Non-blank lines that are not comments.
pub fn count_loc(code: &str) -> u32 {
    code.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .count() as u32
}

fn is_async(node: Node) -> bool {
    node.child(0).is_some_and(|n| n.kind() == "async")
}

fn has_docstring(function: Node, code: &str) -> bool {
    let Some(body) = function.child_by_field_name("body") else {
        return false;
    };
    let mut cursor = body.walk();
    let Some(first) = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")
    else {
        return false;
    };
    if first.kind() != "expression_statement" {
        return false;
    }
    let Some(mut expr) = first.named_child(0) else {
        return false;
    };
    while expr.kind() == "parenthesized_expression" {
        match expr.named_child(0) {
            Some(inner) => expr = inner,
            None => return false,
        }
    }

    let parts: Vec<Node> = match expr.kind() {
        "string" => vec![expr],
        "concatenated_string" => {
            let mut cursor = expr.walk();
            expr.named_children(&mut cursor).collect()
        }
        _ => return false,
    };
    let mut content = String::new();
    for part in parts {
        if part.kind() != "string" || !plain_string_content(part, code, &mut content) {
            return false;
        }
    }
    !content.trim().is_empty()
}

/// Appends the literal text of a `str` literal. f-strings and bytes are not
/// docstrings, even without interpolation.
fn plain_string_content(string: Node, code: &str, out: &mut String) -> bool {
    let mut cursor = string.walk();
    for child in string.named_children(&mut cursor) {
        match child.kind() {
            "string_start" => {
                let prefix = syntax::text(child, code).trim_end_matches(['"', '\'']);
                if prefix.contains(['f', 'F', 'b', 'B']) {
                    return false;
                }
            }
            "interpolation" => return false,
            "string_content" => out.push_str(syntax::text(child, code)),
            _ => {}
        }
    }
    true
}
