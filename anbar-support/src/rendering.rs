//! Text rendering utilities for human-friendly diagnostics.
//!
//! Formats resolution chains, shortens fully-qualified class names and
//! produces "did you mean?" suggestions for unresolvable keys.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use anbar_support::rendering::render_chain;
///
/// let chain = vec!["app::Service", "app::Repo", "app::Service"];
/// assert_eq!(render_chain(&chain), "app::Service → app::Repo → app::Service");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified name for display.
///
/// ```
/// use anbar_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("app::services::UserService"), "UserService");
/// assert_eq!(shorten_type_name("::app::Logger"), "Logger");
/// assert_eq!(shorten_type_name("Arc<dyn app::Logger>"), "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Quick "close enough" check between two names.
///
/// Not a real edit distance: at least 60% of aligned characters must match
/// and the lengths may differ by at most three.
///
/// ```
/// use anbar_support::rendering::is_close;
///
/// assert!(is_close("Database", "Databse"));
/// assert!(!is_close("Database", "Logger"));
/// ```
pub fn is_close(a: &str, b: &str) -> bool {
    if a.len().abs_diff(b.len()) > 3 {
        return false;
    }

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return true;
    }

    let common = a.chars().zip(b.chars()).filter(|(ca, cb)| ca == cb).count();
    common * 100 / max_len >= 60
}

/// Suggests known names that look like `requested`, best match first.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            if is_close(&name_short, &requested_short) {
                return Some((name, 60));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_simple_chain() {
        assert_eq!(render_chain(&["A", "B", "A"]), "A → B → A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_simple_path() {
        assert_eq!(shorten_type_name("app::services::UserService"), "UserService");
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("Logger"), "Logger");
    }

    #[test]
    fn close_names() {
        assert!(is_close("UserService", "UserServise"));
        assert!(!is_close("Database", "Logger"));
        assert!(is_close("", ""));
    }

    #[test]
    fn suggest_typo() {
        let available = vec!["app::UserService", "app::UserRepository", "app::Logger"];
        let suggestions = suggest_similar("app::UserServise", &available, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("app::UserService"));
    }

    #[test]
    fn suggest_skips_exact_and_unrelated() {
        let available = vec!["app::Database"];
        assert!(suggest_similar("app::Database", &available, 3).is_empty());
        assert!(suggest_similar("XyzAbcDef", &available, 3).is_empty());
    }
}
