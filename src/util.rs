//! Shared utility functions for the editor crate.

use maud::html;

/// Escape markup so user-supplied text can be echoed into HTML or logs.
pub fn sanitize(text: &str) -> String {
    html! { (text) }.into_string()
}

/// First line of a (possibly multi-line) message.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Quote a string for inclusion in a POSIX shell command line.
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Rejoin text line by line with `\n`, converting `\r\n` and bare `\r`.
/// A trailing line break in the input is kept.
pub fn normalize_line_endings(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut joined = unified.lines().collect::<Vec<_>>().join("\n");
    if unified.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

/// Relative path with no `..` segment and no leading slash.
pub fn is_safe_relative(path: &str) -> bool {
    !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|segment| segment != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_escapes_markup() {
        assert_eq!(
            sanitize("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert_eq!(sanitize("plain text"), "plain text");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_shell_quote_plain() {
        assert_eq!(shell_quote("docs/index.rst"), "'docs/index.rst'");
    }

    #[test]
    fn test_shell_quote_embedded_quote() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_normalize_crlf() {
        assert_eq!(normalize_line_endings("a\r\nb\r\n"), "a\nb\n");
    }

    #[test]
    fn test_normalize_bare_cr_and_no_trailing_break() {
        assert_eq!(normalize_line_endings("a\rb"), "a\nb");
    }

    #[test]
    fn test_normalize_is_identity_on_unix_text() {
        let text = "Title\n=====\n\nBody\n";
        assert_eq!(normalize_line_endings(text), text);
    }

    #[test]
    fn test_is_safe_relative() {
        assert!(is_safe_relative("module/index.html"));
        assert!(!is_safe_relative("../etc/passwd"));
        assert!(!is_safe_relative("a/../../b"));
        assert!(!is_safe_relative("/abs"));
    }
}
