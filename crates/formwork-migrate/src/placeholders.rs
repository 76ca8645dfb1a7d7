//! Placeholder extraction from template bodies.
//!
//! Formwork templates reference their parameters with `{{name}}` tokens.
//! A name starts with a letter; the remaining characters are letters,
//! digits, underscores, or dashes (dashes survive only until the 0.8.0
//! rename pass strips them from the whole document).

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const PLACEHOLDER_PATTERN: &str = r"\{\{([A-Za-z][A-Za-z0-9_-]*)\}\}";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).unwrap())
}

/// Distinct variable names referenced by `body`.
///
/// Pure set semantics: a name referenced several times counts once, and the
/// sorted order of the result carries no meaning. Malformed brace sequences
/// simply fail to match and are ignored.
pub fn template_variables(body: &str) -> BTreeSet<String> {
    placeholder_regex()
        .captures_iter(body)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// The exact delimited token for a variable, `{{name}}`.
pub fn placeholder_token(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// Rewrite every `{{old}}` token in `body` to `{{new}}`.
///
/// Purely textual: occurrences of `old` outside placeholder delimiters are
/// left alone, as are placeholders whose name merely starts with `old`.
pub fn rewrite_references(body: &str, old: &str, new: &str) -> String {
    body.replace(&placeholder_token(old), &placeholder_token(new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_distinct_names() {
        let body = "Hello {{user_name}}, meet {{other}} and {{user_name}} again";
        let variables = template_variables(body);
        assert_eq!(
            variables.into_iter().collect::<Vec<_>>(),
            vec!["other".to_string(), "user_name".to_string()]
        );
    }

    #[test]
    fn empty_body_has_no_variables() {
        assert!(template_variables("").is_empty());
        assert!(template_variables("no placeholders here").is_empty());
    }

    #[test]
    fn names_start_with_a_letter() {
        assert!(template_variables("{{1abc}}").is_empty());
        assert!(template_variables("{{_abc}}").is_empty());
        let variables = template_variables("{{a1-b_c}}");
        assert!(variables.contains("a1-b_c"));
    }

    #[test]
    fn malformed_braces_are_ignored() {
        assert!(template_variables("{{unclosed").is_empty());
        assert!(template_variables("{single}").is_empty());
        assert!(template_variables("{{bad name}}").is_empty());
        // A triple brace still contains a well-formed token.
        assert!(template_variables("{{{abc}}}").contains("abc"));
    }

    #[test]
    fn rewrites_only_the_exact_token() {
        let body = "{{a-b}} a-b {{a-bc}}";
        assert_eq!(rewrite_references(body, "a-b", "a_b"), "{{a_b}} a-b {{a-bc}}");
    }
}
