//! Title resolver for records that arrive without a title, or with one
//! another record already claimed.

use super::model::NOTE_EXTENSION;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// How much of the content the title is derived from
const TITLE_SOURCE_CHARS: usize = 40;

pub const DEFAULT_TITLE: &str = "Note";

// Characters unsafe in file paths or meaningful to links and frontmatter
static UNSAFE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[\]#*:/\\^.]").unwrap());

/// Derive a file name (with `.md`) from the start of `content`, unused in `existing`.
///
/// `"Foo"` becomes `Foo.md`, or `Foo (1).md`, `Foo (2).md`, ... when taken.
/// Callers resolving several titles must add each result to `existing` before
/// the next call.
pub fn resolve_title(content: &str, existing: &BTreeSet<String>) -> String {
    let head: String = content.chars().take(TITLE_SOURCE_CHARS).collect();
    let flattened = head.replace(['\r', '\n'], " ");
    let stripped = UNSAFE_TITLE_RE.replace_all(&flattened, "");
    let base = match stripped.trim() {
        "" => DEFAULT_TITLE,
        base => base,
    };
    unique_file_name(base, existing)
}

/// `<base>.md`, or the first free `<base> (n).md`
pub fn unique_file_name(base: &str, existing: &BTreeSet<String>) -> String {
    let mut candidate = format!("{}.{}", base, NOTE_EXTENSION);
    let mut n = 1;
    while existing.contains(&candidate) {
        candidate = format!("{} ({}).{}", base, n, NOTE_EXTENSION);
        n += 1;
    }
    candidate
}

/// Whether a remote title can be used as a file name inside the sync folder
pub fn is_safe_title(title: &str) -> bool {
    let title = title.trim();
    !title.is_empty()
        && title != "."
        && title != ".."
        && !title.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_disambiguates_against_existing() {
        let existing = set(&["Foo.md", "Foo (1).md"]);
        assert_eq!(resolve_title("Foo", &existing), "Foo (2).md");
        assert_eq!(resolve_title("Bar", &existing), "Bar.md");
    }

    #[test]
    fn test_strips_unsafe_characters() {
        let existing = BTreeSet::new();
        assert_eq!(resolve_title("# [[Plan]]: v1.2 / draft^", &existing), "Plan v12  draft.md");
        assert_eq!(resolve_title("line one\nline two", &existing), "line one line two.md");
    }

    #[test]
    fn test_uses_first_forty_characters() {
        let content = "a".repeat(60);
        let title = resolve_title(&content, &BTreeSet::new());
        assert_eq!(title, format!("{}.md", "a".repeat(40)));

        // Multi-byte characters count as one
        let content = "é".repeat(45);
        assert_eq!(resolve_title(&content, &BTreeSet::new()), format!("{}.md", "é".repeat(40)));
    }

    #[test]
    fn test_empty_content_defaults_to_note() {
        assert_eq!(resolve_title("", &BTreeSet::new()), "Note.md");
        assert_eq!(resolve_title("#*:.", &BTreeSet::new()), "Note.md");
        assert_eq!(resolve_title("", &set(&["Note.md"])), "Note (1).md");
    }

    #[test]
    fn test_unique_file_name_for_claimed_titles() {
        let existing = set(&["Dup.md"]);
        assert_eq!(unique_file_name("Dup", &existing), "Dup (1).md");
        assert_eq!(unique_file_name("Other", &existing), "Other.md");
    }

    #[test]
    fn test_unsafe_titles() {
        assert!(is_safe_title("Hello world"));
        assert!(is_safe_title("v1.2 notes"));
        for title in ["", "  ", ".", "..", "../../escaped", "a/b", "a\\b", "nul\0"] {
            assert!(!is_safe_title(title), "{:?}", title);
        }
    }

    #[test]
    fn test_deterministic() {
        let existing = set(&["Foo.md"]);
        assert_eq!(resolve_title("Foo", &existing), resolve_title("Foo", &existing));
    }
}
