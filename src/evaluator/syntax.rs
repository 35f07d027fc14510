// src/evaluator/syntax.rs — tree-sitter Python parsing helpers

use std::cell::RefCell;
use tree_sitter::{Node, Parser, Tree};

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // A language load failure surfaces as a None parse below.
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

/// Parse Python source with the thread's pooled parser.
pub fn parse(code: &str) -> Option<Tree> {
    PYTHON_PARSER.with(|p| p.borrow_mut().parse(code, None))
}

/// Parsed source that a Python 3 interpreter would accept, as far as the
/// grammar can tell.
pub fn parse_valid(code: &str) -> Option<Tree> {
    let tree = parse(code)?;
    if tree.root_node().has_error() {
        return None;
    }
    let mut valid = true;
    visit(&tree, |node| {
        if !valid {
            return;
        }
        valid = match node.kind() {
            "print_statement" | "exec_statement" => is_call_form(node, code),
            "function_definition" | "class_definition" => {
                node.child_by_field_name("body").is_some()
            }
            "module" => suite_aligned(node, None, code),
            "block" => suite_aligned(node, node.parent(), code),
            "elif_clause" | "else_clause" | "except_clause" | "except_group_clause"
            | "finally_clause" => clause_aligned(node, code),
            _ => true,
        };
    });
    valid.then_some(tree)
}

/// The grammar recovers from indentation the interpreter rejects: a missing
/// body parses as an empty `block`, and a stray indent or dedent leaves the
/// statement in the enclosing suite at the wrong column. Statements that
/// begin a line must sit at their suite's column, which is 0 for the module
/// and deeper than the owning statement's line for a block.
fn suite_aligned(suite: Node, owner: Option<Node>, code: &str) -> bool {
    let mut cursor = suite.walk();
    let statements: Vec<Node> = suite
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();

    let column = match owner {
        None => 0,
        Some(owner) => {
            let Some(first) = statements.first() else {
                return false;
            };
            // `if x: return 1` keeps its body on the header line
            if !starts_line(*first, code) {
                return true;
            }
            let column = first.start_position().column;
            if column <= line_indent(owner, code) {
                return false;
            }
            column
        }
    };

    statements
        .iter()
        .all(|stmt| !starts_line(*stmt, code) || stmt.start_position().column == column)
}

/// `elif`/`else`/`except`/`finally` line up with the statement they continue.
fn clause_aligned(clause: Node, code: &str) -> bool {
    let Some(parent) = clause.parent() else {
        return true;
    };
    !starts_line(clause, code) || clause.start_position().column == line_indent(parent, code)
}

/// Only whitespace precedes the node on its line.
fn starts_line(node: Node, code: &str) -> bool {
    let start = node.start_byte();
    let line_start = code[..start].rfind('\n').map_or(0, |i| i + 1);
    code[line_start..start].chars().all(|c| c == ' ' || c == '\t')
}

/// Leading whitespace width of the line the node starts on.
fn line_indent(node: Node, code: &str) -> usize {
    let start = node.start_byte();
    let line_start = code[..start].rfind('\n').map_or(0, |i| i + 1);
    code[line_start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// `print(x)` may parse as a print statement; it is still valid Python 3.
fn is_call_form(node: Node, code: &str) -> bool {
    let text = text(node, code);
    let rest = text
        .trim_start_matches("print")
        .trim_start_matches("exec")
        .trim_start();
    rest.starts_with('(')
}

/// Depth-first visit of every node.
pub fn visit<'t>(tree: &'t Tree, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = tree.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

pub fn text<'a>(node: Node, code: &'a str) -> &'a str {
    node.utf8_text(code.as_bytes()).unwrap_or("")
}

/// Positional parameter names of the function called `name`, stopping at
/// `*args` or a bare `*`.
pub fn function_parameters(code: &str, name: &str) -> Option<Vec<String>> {
    let tree = parse_valid(code)?;
    let mut found = None;
    visit(&tree, |node| {
        if found.is_some() || node.kind() != "function_definition" {
            return;
        }
        let Some(fn_name) = node.child_by_field_name("name") else {
            return;
        };
        if text(fn_name, code) != name {
            return;
        }
        let Some(params) = node.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = params.walk();
        let names = params
            .named_children(&mut cursor)
            .take_while(|param| {
                !matches!(
                    param.kind(),
                    "list_splat_pattern" | "keyword_separator" | "dictionary_splat_pattern"
                )
            })
            .filter_map(|param| parameter_name(param, code))
            .collect();
        found = Some(names);
    });
    found
}

fn parameter_name(param: Node, code: &str) -> Option<String> {
    let ident = match param.kind() {
        "identifier" => Some(param),
        "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
        "typed_parameter" => param.named_child(0).filter(|n| n.kind() == "identifier"),
        _ => None,
    }?;
    Some(text(ident, code).to_string())
}
