// src/utils/patterns.rs
use regex::Regex;

/// Compiles a static pattern in multi-line mode so `^`/`$` work per line.
/// Only used for patterns baked into the binary, hence the panic.
pub fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?m){}", pattern))
        .unwrap_or_else(|e| panic!("Failed to compile built-in pattern '{}': {}", pattern, e))
}

pub fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Whole-word matcher for a keyword or keyword fragment.
pub fn whole_word(keyword: &str) -> Regex {
    compile(&format!(r"\b(?:{})\b", keyword))
}
