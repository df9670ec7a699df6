//! Extraction of numbered items and control lines from a reasoning reply.

use forge_core::ComplexityLevel;
use regex::Regex;
use std::sync::LazyLock;

/// Substituted when a reply contains no numbered items.
pub const NO_VIABLE_OUTPUT: &str = "No viable output";

static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,3}[.)]\s+(.*\S)\s*$").expect("valid item regex"));

static COMPLEXITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)COMPLEXITY\W*:\W*(very[ _-]?high|high|medium|low)")
        .expect("valid complexity regex")
});

static IMPROVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)IMPROVE_NEEDED\W*:\W*(yes|no|true|false)").expect("valid improve regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    /// Never empty: falls back to [`NO_VIABLE_OUTPUT`].
    pub items: Vec<String>,
    pub complexity: Option<ComplexityLevel>,
    pub improve_needed: bool,
}

impl ParsedBatch {
    pub fn is_sentinel(&self) -> bool {
        self.items.len() == 1 && self.items[0] == NO_VIABLE_OUTPUT
    }
}

/// Parse a reply. Never fails: malformed replies yield the sentinel item, no complexity and no
/// revision request.
pub fn parse_batch(text: &str, max_items: usize, word_cap: usize) -> ParsedBatch {
    let mut items: Vec<String> = text
        .lines()
        .filter(|line| !is_control_line(line))
        .filter_map(|line| ITEM.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| truncate_words(m.as_str(), word_cap)))
        .filter(|item| !item.is_empty())
        .take(max_items.max(1))
        .collect();
    if items.is_empty() {
        items.push(NO_VIABLE_OUTPUT.to_string());
    }

    let complexity = COMPLEXITY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let improve_needed = IMPROVE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| matches!(m.as_str().to_ascii_lowercase().as_str(), "yes" | "true"))
        .unwrap_or(false);

    ParsedBatch { items, complexity, improve_needed }
}

fn is_control_line(line: &str) -> bool {
    COMPLEXITY.is_match(line) || IMPROVE.is_match(line)
}

fn truncate_words(text: &str, cap: usize) -> String {
    text.split_whitespace().take(cap).collect::<Vec<_>>().join(" ")
}
