/// Truncate to `max_chars` characters, marking the cut with "...".
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head.trim_end())
    }
}

/// Keep at most `max_words` whitespace-separated words.
pub fn limit_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let kept = words[..max_words].join(" ");
    format!(
        "{}...",
        kept.trim_end_matches(|c: char| c == ',' || c == ';' || c == ':')
    )
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "a", "a and b", "a, b and c"
pub fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
