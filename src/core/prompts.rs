// src/core/prompts.rs — Agent system prompts and user prompt builders

use serde::{Deserialize, Serialize};

/// Case-insensitive marker the reviewer emits to approve a draft.
pub const APPROVAL_SENTINEL: &str = "PERFECT";

/// System prompt variants for single-shot baselines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    #[default]
    Minimal,
    Optimized,
    Strict,
}

impl PromptStyle {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            PromptStyle::Minimal => MINIMAL_SYSTEM,
            PromptStyle::Optimized => OPTIMIZED_SYSTEM,
            PromptStyle::Strict => GENERATOR_SYSTEM,
        }
    }
}

const MINIMAL_SYSTEM: &str = "You are an expert Python programmer. Respond ONLY with the raw Python code (no markdown, no explanations).";

const OPTIMIZED_SYSTEM: &str = "You are a world-class Python programmer competing in a coding challenge.

YOUR MISSION: Write PERFECT, PRODUCTION-READY code that passes ALL test cases.

MANDATORY REQUIREMENTS:
1. Include ALL necessary imports (typing, re, math, heapq, collections, itertools, etc.)
2. Follow the EXACT function signature from the problem
3. Handle ALL edge cases:
   - Empty inputs ([], \"\", None)
   - Single element inputs
   - Negative numbers
   - Zero values
   - Large inputs
4. Write efficient O(n) or O(n log n) solutions when possible
5. Use appropriate data structures (dict, set, deque, heap)
6. NO explanations, NO test code, NO print/input statements

OUTPUT: Raw Python code ONLY. No markdown, no comments except docstring.";

pub const GENERATOR_SYSTEM: &str = "You are an expert Python programmer. Generate ONLY the function code to solve the problem.

CRITICAL RULES:
1. Include ALL necessary imports at the top (typing, re, math, heapq, collections, etc.)
2. Follow the EXACT function signature if provided in the problem
3. Write minimal, efficient code - avoid unnecessary complexity
4. Handle edge cases (empty inputs, None, single elements)
5. NO explanations, NO test code, NO print statements
6. Return ONLY the raw Python function code";

pub const REVIEWER_SYSTEM: &str = "You are a code reviewer. Check if the code solves the problem correctly.

REVIEW CHECKLIST:
1. Does it have all required imports?
2. Does the function signature match the problem?
3. Will it handle edge cases (empty lists, None, single elements)?
4. Is the logic correct for the problem description?
5. Is it simple and efficient?

RESPONSE RULES:
- If code is correct and complete: respond ONLY \"PERFECT\"
- If there are issues: state ONE specific fix in 10 words or less
- Be strict but concise";

pub const REFINER_SYSTEM: &str = "You are an expert Python programmer. Fix the code based on feedback.

RULES:
1. Keep ALL imports from the original code
2. Fix ONLY what the feedback mentions
3. Keep the function signature unchanged
4. Make minimal changes - don't rewrite working code
5. Return ONLY the complete fixed Python code, no explanations";

pub fn baseline_user(problem: &str) -> String {
    format!("Problem:\n{}", problem)
}

pub fn generator_user(problem: &str) -> String {
    format!("Write the function for this problem:\n\n{}", problem)
}

pub fn reviewer_user(problem: &str, code: &str) -> String {
    format!(
        "\nProblem Statement:\n{}\n\nCode to Review:\n```python\n{}\n```\nYour Feedback: ",
        problem, code
    )
}

pub fn refiner_user(code: &str, feedback: &str, problem: &str) -> String {
    format!(
        "Fix this code based on the feedback.\n\nProblem:\n{}\n\nCurrent Code:\n```python\n{}\n```\n\nFeedback: {}\n\nFixed Code:",
        problem, code, feedback
    )
}

pub fn is_approval(feedback: &str) -> bool {
    feedback.to_uppercase().contains(APPROVAL_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_approval_case_insensitive() {
        assert!(is_approval("PERFECT"));
        assert!(is_approval("perfect."));
        assert!(is_approval("Looks Perfect to me"));
        assert!(!is_approval("Handle the empty list case"));
    }

    #[test]
    fn test_prompt_styles_distinct() {
        assert_ne!(
            PromptStyle::Minimal.system_prompt(),
            PromptStyle::Optimized.system_prompt()
        );
        assert_eq!(PromptStyle::Strict.system_prompt(), GENERATOR_SYSTEM);
    }

    #[test]
    fn test_user_prompts_embed_inputs() {
        assert_eq!(baseline_user("add"), "Problem:\nadd");
        let review = reviewer_user("sum two ints", "def add(a, b): ...");
        assert!(review.contains("sum two ints"));
        assert!(review.contains("```python\ndef add(a, b): ...\n```"));
        let refine = refiner_user("def f(): pass", "use sum()", "sum a list");
        assert!(refine.contains("Feedback: use sum()"));
        assert!(refine.contains("sum a list"));
    }
}
