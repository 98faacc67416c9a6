/// Keep the first `max_tokens` whitespace-separated tokens of `text`.
///
/// Tokens are rejoined with single spaces. When no tokens survive (blank text
/// or a zero budget) the input is returned unchanged.
pub fn extract(text: &str, max_tokens: usize) -> String {
    let prefix = text
        .split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ");

    if prefix.is_empty() {
        text.to_string()
    } else {
        prefix
    }
}

pub fn extract_all<S: AsRef<str>>(texts: &[S], max_tokens: usize) -> Vec<String> {
    texts
        .iter()
        .map(|text| extract(text.as_ref(), max_tokens))
        .collect()
}
