// src/core/extract.rs — Pull Python source out of model replies

const FENCE: &str = "```";
const PYTHON_FENCE: &str = "```python";

/// Take the first fenced block (preferring a `python`-tagged one) or the
/// whole reply when there is no fence. The result is trimmed.
pub fn extract_code(raw: &str) -> String {
    let body = if let Some(start) = raw.find(PYTHON_FENCE) {
        fenced_body(&raw[start + PYTHON_FENCE.len()..])
    } else if let Some(start) = raw.find(FENCE) {
        fenced_body(&raw[start + FENCE.len()..])
    } else {
        raw
    };
    body.trim().to_string()
}

/// Text up to the closing fence, minus a language tag on the opening line.
fn fenced_body(after_open: &str) -> &str {
    let block = match after_open.find(FENCE) {
        Some(end) => &after_open[..end],
        None => after_open,
    };
    match block.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => block,
    }
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.'))
}

/// Remove top-level test scaffolding a model tends to append: `print(...)`,
/// `assert ...` and `# Test` lines. Indented lines are left alone.
pub fn strip_scaffolding(code: &str) -> String {
    code.lines()
        .filter(|line| {
            !(line.starts_with("print(")
                || line.starts_with("assert ")
                || line.starts_with("# Test"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
