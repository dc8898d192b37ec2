//! Normalization of query text received through escaping transports.
//!
//! Model output often arrives JSON-encoded twice, leaving literal `\n` and
//! `\t` sequences where the query had line breaks. Validators inspect the
//! query as it will execute, so the escapes are resolved first.

use std::fmt;
use std::ops::Deref;

/// Query text that has passed through [`normalize`].
///
/// Validators and executors only accept this type, so raw transport text
/// cannot reach them by accident.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    /// Borrows the normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the normalized text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for NormalizedQuery {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replaces literal `\n` / `\t` escape pairs with newline / tab characters.
///
/// Single left-to-right pass; every other character, including lone
/// backslashes, is copied unchanged. Idempotent because a replacement never
/// produces a backslash.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    chars.next();
                    out.push('\n');
                    continue;
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    NormalizedQuery(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_escaped_line_breaks_and_tabs() {
        let raw = r"MATCH (n:Person)\nWHERE n.age > $min\n\tRETURN n";
        assert_eq!(
            normalize(raw).as_str(),
            "MATCH (n:Person)\nWHERE n.age > $min\n\tRETURN n"
        );
    }

    #[test]
    fn leaves_other_escapes_alone() {
        assert_eq!(normalize(r"a\rb\\c\").as_str(), r"a\rb\\c\");
    }

    #[test]
    fn doubled_backslash_resolves_once() {
        let once = normalize(r"x\\n");
        assert_eq!(once.as_str(), "x\\\n");
        assert_eq!(normalize(once.as_str()), once);
    }

    #[test]
    fn already_normalized_text_is_unchanged() {
        let text = "MATCH (n)\n\tRETURN n";
        assert_eq!(normalize(text).as_str(), text);
    }
}
