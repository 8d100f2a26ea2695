//! Derives a safe storage filename from a human-supplied database name.

/// File extension appended to every tenant database location.
pub const DB_FILE_SUFFIX: &str = ".db";

/// Turns a display name into a collision-safe relative filename.
///
/// Lowercases, collapses whitespace runs to single underscores, and replaces
/// the path-traversal sequences `/`, `\` and `..` with underscores before
/// appending [`DB_FILE_SUFFIX`]. The result is a deterministic, pure function
/// of the input and never an absolute path.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let collapsed = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let mut safe = collapsed.replace("..", "_");
    safe = safe.replace(['/', '\\'], "_");
    safe.push_str(DB_FILE_SUFFIX);
    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_is_deterministic() {
        assert_eq!(sanitize_name("My Notes"), sanitize_name("My Notes"));
        assert_eq!(sanitize_name("My Notes"), "my_notes.db");
    }

    #[test]
    fn test_sanitize_lowercases_and_collapses_whitespace() {
        assert_eq!(sanitize_name("My   Big\tProject"), "my_big_project.db");
        assert_eq!(sanitize_name("  padded  "), "padded.db");
    }

    #[test]
    fn test_sanitize_strips_path_traversal() {
        assert_eq!(sanitize_name("../../etc/passwd"), "____etc_passwd.db");
        assert!(!sanitize_name("..\\windows").contains('\\'));
        assert!(!sanitize_name("a/b/c").contains('/'));
    }

    #[test]
    fn test_sanitize_never_produces_parent_reference() {
        for name in ["..", ". .", "....", "a..b", "../x"] {
            let loc = sanitize_name(name);
            assert!(!loc.contains(".."), "{name} -> {loc}");
        }
    }
}
