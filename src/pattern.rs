//! Route patterns: normalization, token expansion, anchored matching.
//!
//! A pattern is a regular expression over the dispatch path with three
//! shorthand tokens:
//!
//! | Token     | Expands to          |
//! |-----------|---------------------|
//! | `:string` | `[a-zA-Z]+`         |
//! | `:number` | `[0-9]+`            |
//! | `:alpha`  | `[a-zA-Z0-9_-]+`    |
//!
//! A token outside any capturing group becomes a capture group of its own,
//! so its text is handed to the handler. Inside a capturing group
//! (`(:number)`, `(:string|:number)`) it expands bare and the enclosing
//! group is the capture.
//!
//! # Caveat
//!
//! Apart from the tokens, a pattern is used verbatim: `.` matches any
//! character, `|` splits the anchored expression, and so on. Escape
//! metacharacters yourself (`/feed\.xml`) when you mean them literally.
//!
//! Classes follow the `regex` crate, which is Unicode-aware by default: `\d`
//! also matches non-ASCII digits such as `٣`, and `\w` non-ASCII letters.
//! Write `[0-9]` (or `:number`), or turn Unicode off with `(?-u:\d)`, for
//! ASCII only.

use regex::Regex;

const TOKENS: [(&str, &str); 3] = [
    (":string", "[a-zA-Z]+"),
    (":number", "[0-9]+"),
    (":alpha",  "[a-zA-Z0-9_-]+"),
];

/// Normalizes a pattern to exactly one leading `/` and no trailing `/`.
///
/// `"/about/"`, `"about"` and `"/about"` all become `"/about"`; `""` and `"/"`
/// become `"/"`.
pub fn normalize(pattern: &str) -> String {
    format!("/{}", pattern.trim_matches('/'))
}

/// A compiled, anchored route pattern.
#[derive(Clone, Debug)]
pub struct Matcher {
    pattern: String,
    regex: Regex,
}

impl Matcher {
    /// Expands the tokens in `pattern` and anchors the result at both ends.
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^{}$", expand(pattern)))?;
        Ok(Self { pattern: pattern.to_owned(), regex })
    }

    /// The pattern as registered.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The anchored expression the pattern compiled to.
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches `path` against the whole pattern.
    ///
    /// Returns the capture groups left to right, without the full match. A
    /// group that did not participate yields `""`, unless every group after
    /// it also did not participate, in which case the tail is dropped.
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(path)?;
        let mut groups: Vec<Option<&str>> = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str()))
            .collect();
        while matches!(groups.last(), Some(None)) {
            groups.pop();
        }
        Some(groups.into_iter().map(|g| g.unwrap_or_default().to_owned()).collect())
    }
}

/// Single left-to-right substitution pass; replaced text is never rescanned.
///
/// A token is wrapped in its own group only outside every capturing group.
/// Inside one (`(:number)`, `(:string|:number)`) it expands bare, so the
/// enclosing group is the single capture.
fn expand(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 16);
    // One entry per open group: whether it captures.
    let mut groups: Vec<bool> = Vec::new();
    let mut in_class = false;
    let mut i = 0;

    while let Some(ch) = pattern[i..].chars().next() {
        let rest = &pattern[i..];

        if !in_class {
            if let Some((token, fragment)) = TOKENS.iter().find(|(t, _)| rest.starts_with(t)) {
                if groups.contains(&true) {
                    out.push_str(fragment);
                } else {
                    out.push('(');
                    out.push_str(fragment);
                    out.push(')');
                }
                i += token.len();
                continue;
            }
        }

        match ch {
            '\\' => {
                // Copy the escaped character along with the backslash.
                out.push(ch);
                i += 1;
                if let Some(next) = pattern[i..].chars().next() {
                    out.push(next);
                    i += next.len_utf8();
                }
                continue;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class  => in_class = false,
            '(' if !in_class => groups.push(captures_group(&rest[1..])),
            ')' if !in_class => {
                groups.pop();
            }
            _ => {}
        }

        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Whether a group opening right before `after` captures: plain and named
/// groups do, `(?:…)` and flag groups do not.
fn captures_group(after: &str) -> bool {
    !after.starts_with('?') || after.starts_with("?P<") || after.starts_with("?<")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(pattern: &str, path: &str) -> Option<Vec<String>> {
        Matcher::compile(pattern).unwrap().captures(path)
    }

    #[test]
    fn normalize_trims_and_prefixes() {
        assert_eq!(normalize("/about/"), "/about");
        assert_eq!(normalize("about"), "/about");
        assert_eq!(normalize("/about"), "/about");
        assert_eq!(normalize("//nested//path//"), "/nested//path");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn normalize_is_idempotent() {
        for p in ["", "/", "a", "/a/", "//a/b//", "/user/:number", "x/(\\d+)/"] {
            let once = normalize(p);
            assert_eq!(normalize(&once), once, "{p}");
        }
    }

    #[test]
    fn number_token_captures_digits_only() {
        assert_eq!(caps("/user/:number", "/user/42"), Some(vec!["42".to_owned()]));
        assert_eq!(caps("/user/:number", "/user/abc"), None);
        assert_eq!(caps("/user/:number", "/user/"), None);
    }

    #[test]
    fn string_and_alpha_tokens() {
        assert_eq!(caps("/tag/:string", "/tag/rust"), Some(vec!["rust".to_owned()]));
        assert_eq!(caps("/tag/:string", "/tag/rust2"), None);
        assert_eq!(
            caps("/post/:alpha/:number", "/post/hello-world_2/7"),
            Some(vec!["hello-world_2".to_owned(), "7".to_owned()]),
        );
        assert_eq!(caps("/post/:alpha", "/post/a.b"), None);
    }

    #[test]
    fn grouped_token_is_captured_once() {
        let m = Matcher::compile("/user/(:number)").unwrap();
        assert_eq!(m.expression(), "^/user/([0-9]+)$");
        assert_eq!(m.captures("/user/7"), Some(vec!["7".to_owned()]));
    }

    #[test]
    fn token_inside_alternation_is_not_captured_again() {
        let m = Matcher::compile("/(:string|:number)").unwrap();
        assert_eq!(m.expression(), "^/([a-zA-Z]+|[0-9]+)$");
        assert_eq!(m.captures("/abc"), Some(vec!["abc".to_owned()]));
        assert_eq!(m.captures("/42"), Some(vec!["42".to_owned()]));
    }

    #[test]
    fn tokens_inside_a_wider_group_share_its_capture() {
        assert_eq!(caps("/(:string/:number)", "/ab/7"), Some(vec!["ab/7".to_owned()]));
        assert_eq!(
            caps("/(?:x/):number/(?P<tail>:alpha)", "/x/3/a-b"),
            Some(vec!["3".to_owned(), "a-b".to_owned()]),
        );
    }

    #[test]
    fn escaped_parenthesis_does_not_open_a_group() {
        let m = Matcher::compile("/f\\(:number\\)").unwrap();
        assert_eq!(m.expression(), "^/f\\(([0-9]+)\\)$");
        assert_eq!(m.captures("/f(3)"), Some(vec!["3".to_owned()]));
    }

    #[test]
    fn digit_class_is_unicode_aware() {
        assert!(caps("/n/\\d+", "/n/\u{663}").is_some());
        assert!(caps("/n/:number", "/n/\u{663}").is_none());
    }

    #[test]
    fn match_is_anchored() {
        assert_eq!(caps("/about", "/about"), Some(vec![]));
        assert_eq!(caps("/about", "/about/team"), None);
        assert_eq!(caps("/about", "/x/about"), None);
    }

    #[test]
    fn root_pattern_matches_root_path() {
        assert_eq!(caps(&normalize(""), "/"), Some(vec![]));
    }

    #[test]
    fn metacharacters_are_not_escaped() {
        assert!(caps("/feed.xml", "/feedaxml").is_some());
        assert!(caps("/feed\\.xml", "/feedaxml").is_none());
    }

    #[test]
    fn raw_groups_are_captured_too() {
        assert_eq!(
            caps("/blog(/\\d+)?(/[a-z]+)?", "/blog/2024/news"),
            Some(vec!["/2024".to_owned(), "/news".to_owned()]),
        );
        assert_eq!(caps("/blog(/\\d+)?(/[a-z]+)?", "/blog/news"), Some(vec!["".to_owned(), "/news".to_owned()]));
        assert_eq!(caps("/blog(/\\d+)?(/[a-z]+)?", "/blog"), Some(vec![]));
    }

    #[test]
    fn invalid_expression_fails_to_compile() {
        assert!(Matcher::compile("/broken(").is_err());
    }
}
