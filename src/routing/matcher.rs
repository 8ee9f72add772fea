//! Pattern compilation and path matching.
//!
//! # Responsibilities
//! - Assemble a normalized pattern from global prefix, file prefix and sub-pattern
//! - Compile `:name` placeholders into an anchored regex
//! - Extract captured values aligned with the parameter names
//!
//! # Syntax
//! - `:name` captures one segment (`[^/#?]+?`)
//! - `:name(\d+)` captures with a custom sub-pattern
//! - `(\d+)` captures into a parameter named by its ordinal
//! - `?`, `*`, `+` after a parameter make it optional, repeated, or both
//! - `\x` escapes a literal character
//!
//! # Design Decisions
//! - Case-insensitive, one trailing delimiter tolerated
//! - Custom sub-patterns may not contain capturing groups, so every
//!   capture group of the compiled regex is a parameter
//! - Captured values are returned undecoded

use std::collections::BTreeMap;

use regex::Regex;

const DEFAULT_SEGMENT: &str = "[^/#?]+?";
const DELIMITER: &str = "[/#?]";
const PREFIXES: &str = "./";

/// Build the full pattern for an endpoint.
///
/// Every piece is split on `/` and empty pieces vanish, so the result has
/// exactly one leading slash and never a doubled separator. A sub-pattern
/// ending in `/` keeps one trailing slash, which the matcher then requires.
pub fn assemble_pattern(global_prefix: Option<&str>, file_prefix: &str, sub_pattern: &str) -> String {
    let segments: Vec<&str> = global_prefix
        .into_iter()
        .chain([file_prefix, sub_pattern])
        .flat_map(|piece| piece.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();

    let trailing = sub_pattern.ends_with('/') && sub_pattern.chars().any(|c| c != '/');
    let mut pattern = format!("/{}", segments.join("/"));
    if trailing && pattern.len() > 1 {
        pattern.push('/');
    }
    pattern
}

/// Join the file-level `prefix`, route name and `suffix` into one relative path.
///
/// Empty and `.` segments are dropped; the result has no leading or trailing slash.
pub fn join_file_prefix(prefix: &str, route: &str, suffix: &str) -> String {
    [prefix, route, suffix]
        .iter()
        .flat_map(|piece| piece.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Why a pattern failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub reason: String,
}

impl PatternError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for PatternError {}

/// A compiled pattern: the regex plus its ordered parameter names.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    regex: Regex,
    keys: Vec<String>,
}

impl PathMatcher {
    /// Compile a pattern such as `/items/:id`.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let tokens = parse(lex(pattern)?)?;
        let mut source = String::from("(?i)^");
        let mut keys = Vec::new();

        for token in &tokens {
            match token {
                Token::Literal(text) => source.push_str(&regex::escape(text)),
                Token::Param(param) => {
                    source.push_str(&param.to_regex());
                    keys.push(param.name.clone());
                }
            }
        }
        source.push_str(DELIMITER);
        source.push_str("?$");

        let regex = Regex::new(&source).map_err(|e| PatternError::new(e.to_string()))?;
        if regex.captures_len() != keys.len() + 1 {
            return Err(PatternError::new("Capturing groups are not allowed"));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            keys,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameter names, in capture order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Captured values aligned with [`keys`](Self::keys); `None` for an
    /// optional parameter that did not participate.
    pub fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.captures(path)?;
        Some(
            (1..=self.keys.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// Match `path` and bind the captured values to their names.
    pub fn match_path(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let values = self.captures(path)?;
        Some(
            self.keys
                .iter()
                .zip(values)
                .filter_map(|(key, value)| value.map(|v| (key.clone(), v)))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Modifier(char),
    Escaped(char),
    Char(char),
    Name(String),
    Pattern(String),
}

fn lex(input: &str) -> Result<Vec<Lexeme>, PatternError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c @ ('*' | '+' | '?') => {
                out.push(Lexeme::Modifier(c));
                i += 1;
            }
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| PatternError::new(format!("Dangling escape at {}", i)))?;
                out.push(Lexeme::Escaped(*escaped));
                i += 2;
            }
            ':' => {
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                if j == start {
                    return Err(PatternError::new(format!("Missing parameter name at {}", i)));
                }
                out.push(Lexeme::Name(chars[start..j].iter().collect()));
                i = j;
            }
            '(' => {
                let (pattern, next) = lex_group(&chars, i)?;
                out.push(Lexeme::Pattern(pattern));
                i = next;
            }
            c => {
                out.push(Lexeme::Char(c));
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Read a balanced `( ... )` group starting at `open`; returns its body and
/// the index after the closing paren.
fn lex_group(chars: &[char], open: usize) -> Result<(String, usize), PatternError> {
    if chars.get(open + 1) == Some(&'?') {
        return Err(PatternError::new(format!("Pattern cannot start with \"?\" at {}", open + 1)));
    }

    let mut depth = 1;
    let mut body = String::new();
    let mut j = open + 1;

    while j < chars.len() {
        match chars[j] {
            '\\' => {
                body.push('\\');
                if let Some(next) = chars.get(j + 1) {
                    body.push(*next);
                }
                j += 2;
                continue;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    j += 1;
                    break;
                }
            }
            '(' => {
                depth += 1;
                if chars.get(j + 1) != Some(&'?') {
                    return Err(PatternError::new(format!("Capturing groups are not allowed at {}", j)));
                }
            }
            _ => {}
        }
        body.push(chars[j]);
        j += 1;
    }

    if depth > 0 {
        return Err(PatternError::new(format!("Unbalanced pattern at {}", open)));
    }
    if body.is_empty() {
        return Err(PatternError::new(format!("Missing pattern at {}", open)));
    }

    Ok((body, j))
}

#[derive(Debug, Clone, PartialEq)]
struct Param {
    name: String,
    prefix: String,
    pattern: String,
    modifier: Option<char>,
}

impl Param {
    fn to_regex(&self) -> String {
        let prefix = regex::escape(&self.prefix);
        let pattern = &self.pattern;
        let repeated = matches!(self.modifier, Some('*' | '+'));

        if !prefix.is_empty() {
            if repeated {
                let optional = if self.modifier == Some('*') { "?" } else { "" };
                format!("(?:{prefix}((?:{pattern})(?:{prefix}(?:{pattern}))*)){optional}")
            } else {
                let modifier = self.modifier.map(String::from).unwrap_or_default();
                format!("(?:{prefix}({pattern})){modifier}")
            }
        } else if repeated {
            format!("((?:{pattern}){})", self.modifier.unwrap_or('+'))
        } else {
            let modifier = self.modifier.map(String::from).unwrap_or_default();
            format!("({pattern}){modifier}")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Param(Param),
}

fn parse(lexemes: Vec<Lexeme>) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut ordinal = 0usize;
    let mut iter = lexemes.into_iter().peekable();

    while let Some(lexeme) = iter.next() {
        // A single char directly before a parameter may become its prefix.
        let before_param = matches!(iter.peek(), Some(Lexeme::Name(_) | Lexeme::Pattern(_)));
        let (leading, lexeme) = match lexeme {
            Lexeme::Char(c) if before_param => (Some(c), iter.next().unwrap_or(Lexeme::Char(c))),
            other => (None, other),
        };

        let (name, pattern) = match lexeme {
            Lexeme::Name(name) => {
                let pattern = match iter.peek() {
                    Some(Lexeme::Pattern(_)) => match iter.next() {
                        Some(Lexeme::Pattern(p)) => Some(p),
                        _ => None,
                    },
                    _ => None,
                };
                (Some(name), pattern)
            }
            Lexeme::Pattern(p) => (None, Some(p)),
            Lexeme::Char(c) | Lexeme::Escaped(c) => {
                literal.push(c);
                continue;
            }
            Lexeme::Modifier(c) => {
                return Err(PatternError::new(format!("Unexpected modifier \"{}\"", c)));
            }
        };

        let mut prefix = String::new();
        if let Some(c) = leading {
            if PREFIXES.contains(c) {
                prefix.push(c);
            } else {
                literal.push(c);
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        let name = name.unwrap_or_else(|| {
            let n = ordinal.to_string();
            ordinal += 1;
            n
        });
        let modifier = match iter.peek() {
            Some(Lexeme::Modifier(m)) => {
                let m = *m;
                iter.next();
                Some(m)
            }
            _ => None,
        };

        tokens.push(Token::Param(Param {
            name,
            prefix,
            pattern: pattern.unwrap_or_else(|| DEFAULT_SEGMENT.to_string()),
            modifier,
        }));
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        PathMatcher::compile(pattern)
            .unwrap()
            .match_path(path)
            .map(|m| m.into_iter().collect())
    }

    #[test]
    fn test_assemble_pattern_has_single_slashes() {
        assert_eq!(assemble_pattern(None, "", ""), "/");
        assert_eq!(assemble_pattern(None, "users", "/"), "/users");
        assert_eq!(assemble_pattern(None, "users", "/:id"), "/users/:id");
        assert_eq!(assemble_pattern(Some("/api"), "", "/"), "/api");
        assert_eq!(assemble_pattern(Some("/api/"), "/v1/users/", "//:id"), "/api/v1/users/:id");
        assert_eq!(assemble_pattern(Some(""), "", "health"), "/health");
        assert_eq!(assemble_pattern(None, "users", "//"), "/users");
    }

    #[test]
    fn test_trailing_slash_in_sub_pattern_is_kept() {
        let pattern = assemble_pattern(Some("/api/"), "/v1/users/", "//:id/");
        assert_eq!(pattern, "/api/v1/users/:id/");
        assert_eq!(assemble_pattern(None, "", "/x/"), "/x/");

        let matcher = PathMatcher::compile(&assemble_pattern(None, "", "/x/")).unwrap();
        assert!(matcher.match_path("/x/").is_some());
        assert!(matcher.match_path("/x").is_none());
    }

    #[test]
    fn test_join_file_prefix() {
        assert_eq!(join_file_prefix("", "index", ""), "index");
        assert_eq!(join_file_prefix("/v1/", "users", ""), "v1/users");
        assert_eq!(join_file_prefix("", "users", "./admin"), "users/admin");
    }

    #[test]
    fn test_named_parameter() {
        assert_eq!(
            params("/items/:id", "/items/42"),
            Some(vec![("id".to_string(), "42".to_string())])
        );
        assert_eq!(params("/items/:id", "/items"), None);
        assert_eq!(params("/items/:id", "/items/42/extra"), None);
    }

    #[test]
    fn test_case_insensitive_with_trailing_slash() {
        let matcher = PathMatcher::compile("/Items/:id").unwrap();
        assert!(matcher.match_path("/items/7/").is_some());
        assert!(matcher.match_path("/ITEMS/7").is_some());
        assert!(matcher.match_path("/items/7//").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let matcher = PathMatcher::compile("/").unwrap();
        assert!(matcher.match_path("/").is_some());
        assert!(matcher.match_path("").is_none());
        assert!(matcher.match_path("/x").is_none());
    }

    #[test]
    fn test_optional_parameter() {
        let matcher = PathMatcher::compile("/files/:name?").unwrap();
        assert_eq!(matcher.keys(), &["name".to_string()]);
        assert_eq!(matcher.match_path("/files").unwrap().len(), 0);
        assert_eq!(matcher.match_path("/files/a.txt").unwrap()["name"], "a.txt");
    }

    #[test]
    fn test_repeated_parameter() {
        assert_eq!(
            params("/docs/:path*", "/docs/a/b/c"),
            Some(vec![("path".to_string(), "a/b/c".to_string())])
        );
        assert_eq!(params("/docs/:path*", "/docs"), Some(vec![]));
        assert_eq!(params("/docs/:path+", "/docs"), None);
    }

    #[test]
    fn test_custom_and_unnamed_patterns() {
        assert_eq!(
            params("/users/:id(\\d+)", "/users/12"),
            Some(vec![("id".to_string(), "12".to_string())])
        );
        assert_eq!(params("/users/:id(\\d+)", "/users/abc"), None);

        let matcher = PathMatcher::compile("/v(\\d+)/:name").unwrap();
        assert_eq!(matcher.keys(), &["0".to_string(), "name".to_string()]);
        let bound = matcher.match_path("/v2/bob").unwrap();
        assert_eq!(bound["0"], "2");
        assert_eq!(bound["name"], "bob");
    }

    #[test]
    fn test_dot_prefix_and_escapes() {
        assert_eq!(
            params("/report.:ext?", "/report.csv"),
            Some(vec![("ext".to_string(), "csv".to_string())])
        );
        assert!(PathMatcher::compile("/a\\:b").unwrap().match_path("/a:b").is_some());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PathMatcher::compile("/users/:").is_err());
        assert!(PathMatcher::compile("/users/:id((\\d+))").is_err());
        assert!(PathMatcher::compile("/users/(").is_err());
        assert!(PathMatcher::compile("/users/*").is_err());
        assert!(PathMatcher::compile("/users/()").is_err());
    }

    #[test]
    fn test_keys_align_with_captures() {
        let matcher = PathMatcher::compile("/a/:x/b/:y?/:z*").unwrap();
        let values = matcher.captures("/a/1/b/2/3/4").unwrap();
        assert_eq!(values.len(), matcher.keys().len());
    }
}
