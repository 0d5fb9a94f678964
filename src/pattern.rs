//! SQL `LIKE` pattern helpers: escaping submitted text and evaluating patterns
//! against in-memory values.

/// Escape character used in every generated pattern.
pub const ESCAPE: char = '\\';

/// Escape `%`, `_` and the escape character so `value` matches literally.
#[must_use]
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | ESCAPE) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// `%<escaped>%`: rows whose column contains `value` anywhere.
#[must_use]
pub fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    AnyOne,
    AnyMany,
}

/// A compiled, case-insensitive `LIKE` pattern with `\` as escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern {
    tokens: Vec<Token>,
}

impl LikePattern {
    pub fn new(pattern: &str) -> Self {
        let mut tokens = Vec::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => {
                    // consecutive `%` collapse
                    if tokens.last() != Some(&Token::AnyMany) {
                        tokens.push(Token::AnyMany);
                    }
                }
                '_' => tokens.push(Token::AnyOne),
                ESCAPE => {
                    // a trailing escape matches itself
                    let literal = chars.next().unwrap_or(ESCAPE);
                    tokens.extend(literal.to_lowercase().map(Token::Char));
                }
                other => tokens.extend(other.to_lowercase().map(Token::Char)),
            }
        }
        Self { tokens }
    }

    pub fn matches(&self, text: &str) -> bool {
        // per-char, the same folding `new` applies to the pattern
        let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
        let (mut t, mut p) = (0usize, 0usize);
        // last `%` seen and the text position it is currently absorbing up to
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            match self.tokens.get(p) {
                Some(Token::AnyMany) => {
                    backtrack = Some((p, t));
                    p += 1;
                }
                Some(Token::AnyOne) => {
                    p += 1;
                    t += 1;
                }
                Some(Token::Char(c)) if *c == text[t] => {
                    p += 1;
                    t += 1;
                }
                _ => match backtrack {
                    Some((star, absorbed)) => {
                        p = star + 1;
                        t = absorbed + 1;
                        backtrack = Some((star, absorbed + 1));
                    }
                    None => return false,
                },
            }
        }
        self.tokens[p..].iter().all(|tok| *tok == Token::AnyMany)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_meta_characters() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(contains_pattern("al"), "%al%");
    }

    #[test]
    fn substring_matching_is_case_insensitive() {
        let p = LikePattern::new(&contains_pattern("ALI"));
        assert!(p.matches("Alice"));
        assert!(p.matches("Natalie"));
        assert!(!p.matches("Bob"));
    }

    #[test]
    fn escaped_wildcards_match_literally() {
        let p = LikePattern::new(&contains_pattern("5%"));
        assert!(p.matches("save 5% today"));
        assert!(!p.matches("save 50 today"));

        let p = LikePattern::new(&contains_pattern("a_b"));
        assert!(p.matches("xa_by"));
        assert!(!p.matches("xacby"));
    }

    #[test]
    fn non_ascii_text_matches_itself() {
        let p = LikePattern::new(&contains_pattern("ΟΔΟΣ"));
        assert!(p.matches("ΟΔΟΣ"));
        assert!(p.matches("οδος"));
        assert!(LikePattern::new(&contains_pattern("ÄRGER")).matches("Ärger im Büro"));
    }

    #[test]
    fn raw_wildcards() {
        assert!(LikePattern::new("a_c").matches("abc"));
        assert!(!LikePattern::new("a_c").matches("abbc"));
        assert!(LikePattern::new("a%c%").matches("abxcz"));
        assert!(LikePattern::new("%%").matches(""));
        assert!(!LikePattern::new("_").matches(""));
    }
}
