pub mod config;
pub mod validation;

/// First `max` characters of `s`.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Comma separated target list for multi-target commands.
pub fn join_targets(targets: &[String]) -> String {
    targets.join(",")
}

pub fn format_score(score: u32, max_score: u32) -> String {
    format!("{} / {}", score, max_score)
}
