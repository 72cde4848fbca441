//! Parser for Valve's nested key-value text format (`.vdf` / `.acf`)
//!
//! Both the per-game `appmanifest_*.acf` files and `libraryfolders.vdf` use the
//! same grammar:
//!
//! ```text
//! "AppState"
//! {
//!     "appid"      "100"
//!     "name"       "Game A"
//!     // line comments are allowed outside strings
//! }
//! ```
//!
//! A document is an implicit top-level mapping. Values are either strings or
//! brace-delimited blocks. Keys are never deduplicated: a repeated key yields a
//! second entry, and entries keep the order they were encountered in.
//!
//! # Examples
//!
//! ```
//! use steamsweep::vdf;
//!
//! let root = vdf::parse(r#""AppState" { "appid" "100" "name" "Game A" }"#).unwrap();
//! let state = root.get("appstate").unwrap();
//! assert_eq!(state.get("appid").and_then(|n| n.as_str()), Some("100"));
//! ```

use crate::error::{Result, SweepError};
use std::iter::Peekable;
use std::str::Chars;

/// Deepest block nesting accepted; real manifests and user configs stay far below it
const MAX_DEPTH: usize = 64;

/// A parsed value: a string leaf or an ordered list of key/value entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Map(Vec<(String, Node)>),
}

impl Node {
    /// First entry whose key matches, ignoring ASCII case
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Every entry whose key matches, in encountered order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.entries()
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Follow a chain of keys through nested maps
    pub fn get_path(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Entries of a map; a leaf has none
    pub fn entries(&self) -> &[(String, Node)] {
        match self {
            Node::Map(entries) => entries,
            Node::Leaf(_) => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value),
            Node::Map(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

#[derive(Debug, PartialEq)]
enum TokenKind {
    Str(String),
    Open,
    Close,
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> SweepError {
        SweepError::MalformedInput {
            line,
            column,
            message: message.into(),
        }
    }

    /// Skip whitespace and `//` comments
    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return;
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);

        let kind = match self.chars.peek() {
            None => return Ok(None),
            Some('{') => {
                self.bump();
                TokenKind::Open
            }
            Some('}') => {
                self.bump();
                TokenKind::Close
            }
            Some('"') => {
                self.bump();
                TokenKind::Str(self.quoted(line, column)?)
            }
            Some(_) => TokenKind::Str(self.bare()),
        };

        Ok(Some(Token { kind, line, column }))
    }

    fn quoted(&mut self, line: usize, column: usize) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(line, column, "unterminated quoted string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.chars.peek().copied() {
                    Some(c @ ('"' | '\\')) => {
                        self.bump();
                        value.push(c);
                    }
                    // Unknown escapes are kept verbatim
                    _ => value.push('\\'),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut value = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            value.push(c);
            self.bump();
        }
        value
    }
}

/// Parse a whole document into its implicit top-level map
pub fn parse(text: &str) -> Result<Node> {
    let mut lexer = Lexer::new(text);
    let entries = parse_entries(&mut lexer, None, 0)?;
    Ok(Node::Map(entries))
}

/// Parse raw file contents; invalid UTF-8 is reported at the first bad byte
pub fn parse_bytes(bytes: &[u8]) -> Result<Node> {
    match std::str::from_utf8(bytes) {
        Ok(text) => parse(text),
        Err(e) => {
            let valid = String::from_utf8_lossy(&bytes[..e.valid_up_to()]);
            let line = valid.matches('\n').count() + 1;
            let column = valid.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
            Err(SweepError::MalformedInput {
                line,
                column,
                message: "invalid UTF-8".to_string(),
            })
        }
    }
}

/// Parse key/value pairs until end of input (top level) or the `}` closing
/// the block opened at `open`, which sits `depth` blocks deep
fn parse_entries(
    lexer: &mut Lexer<'_>,
    open: Option<(usize, usize)>,
    depth: usize,
) -> Result<Vec<(String, Node)>> {
    let mut entries = Vec::new();

    loop {
        let Some(token) = lexer.next_token()? else {
            return match open {
                None => Ok(entries),
                Some((line, column)) => Err(lexer.error(line, column, "unclosed '{'")),
            };
        };

        let key = match token.kind {
            TokenKind::Str(key) => key,
            TokenKind::Close if open.is_some() => return Ok(entries),
            TokenKind::Close => {
                return Err(lexer.error(token.line, token.column, "unbalanced '}'"));
            }
            TokenKind::Open => {
                return Err(lexer.error(token.line, token.column, "expected a key, found '{'"));
            }
        };

        let value = match lexer.next_token()? {
            Some(Token {
                kind: TokenKind::Str(value),
                ..
            }) => Node::Leaf(value),
            Some(Token {
                kind: TokenKind::Open,
                line,
                column,
            }) => {
                if depth >= MAX_DEPTH {
                    return Err(lexer.error(line, column, "nesting too deep"));
                }
                Node::Map(parse_entries(lexer, Some((line, column)), depth + 1)?)
            }
            Some(Token { line, column, .. }) => {
                return Err(lexer.error(line, column, format!("expected a value for '{}'", key)));
            }
            None => {
                return Err(lexer.error(
                    lexer.line,
                    lexer.column,
                    format!("unexpected end of input after key '{}'", key),
                ));
            }
        };

        entries.push((key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
"AppState"
{
	"appid"		"100"
	"Universe"		"1"
	"name"		"Game A"
	"installdir"		"gamea"
	"SizeOnDisk"		"500"
	"InstalledDepots"
	{
		"101"
		{
			"manifest"		"7094215385826582315"
			"size"		"500"
		}
	}
}
"#;

    fn leaf(node: Option<&Node>) -> Option<&str> {
        node.and_then(Node::as_str)
    }

    #[test]
    fn test_parse_manifest() {
        let root = parse(MANIFEST).unwrap();
        let state = root.get("AppState").unwrap();
        assert_eq!(leaf(state.get("appid")), Some("100"));
        assert_eq!(leaf(state.get("name")), Some("Game A"));
        assert_eq!(
            leaf(state.get_path(&["InstalledDepots", "101", "size"])),
            Some("500")
        );
    }

    #[test]
    fn test_order_preserved() {
        let root = parse(r#""b" "1" "a" "2" "c" "3""#).unwrap();
        let keys: Vec<&str> = root.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_keys_retained() {
        let root = parse(r#""k" "first" "other" "x" "k" "second""#).unwrap();
        let all: Vec<&str> = root.get_all("k").filter_map(Node::as_str).collect();
        assert_eq!(all, vec!["first", "second"]);
        assert_eq!(root.entries().len(), 3);
        assert_eq!(leaf(root.get("k")), Some("first"));
    }

    #[test]
    fn test_numeric_keys_keep_encountered_order() {
        let root = parse(r#""libraryfolders" { "10" { "path" "/b" } "2" { "path" "/a" } }"#).unwrap();
        let keys: Vec<&str> = root
            .get("libraryfolders")
            .unwrap()
            .entries()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["10", "2"]);
    }

    #[test]
    fn test_escapes() {
        let root = parse(r#""path" "D:\\Games\\Steam" "quote" "say \"hi\"" "raw" "a\nb""#).unwrap();
        assert_eq!(leaf(root.get("path")), Some(r"D:\Games\Steam"));
        assert_eq!(leaf(root.get("quote")), Some(r#"say "hi""#));
        assert_eq!(leaf(root.get("raw")), Some(r"a\nb"));
    }

    #[test]
    fn test_comments_and_bare_keys() {
        let text = "// header comment\nroot // trailing\n{\n  url \"http://x//y\" // note\n}\n";
        let root = parse(text).unwrap();
        let block = root.get("root").unwrap();
        assert_eq!(leaf(block.get("url")), Some("http://x//y"));
    }

    #[test]
    fn test_bare_values_accepted() {
        // Hand-edited configs drop the quotes; the Steam client reads these too
        let root = parse("root { key value \"n\" 42 }").unwrap();
        let block = root.get("root").unwrap();
        assert_eq!(leaf(block.get("key")), Some("value"));
        assert_eq!(leaf(block.get("n")), Some("42"));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "\"k\" {".repeat(depth), "}".repeat(depth));
        assert!(parse(&nested(MAX_DEPTH)).is_ok());

        match parse(&nested(200_000)) {
            Err(SweepError::MalformedInput { message, column, .. }) => {
                assert_eq!(message, "nesting too deep");
                assert_eq!(column, MAX_DEPTH * 5 + 5);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_position() {
        let err = parse_bytes(b"\"a\" \"b\"\n\"c\" \"\xff\"").unwrap_err();
        assert!(matches!(
            err,
            SweepError::MalformedInput { line: 2, column: 6, .. }
        ));
        assert!(parse_bytes(b"\"a\" \"b\"").is_ok());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse("  \n// nothing\n").unwrap(), Node::Map(vec![]));
    }

    #[test]
    fn test_unclosed_brace() {
        let err = parse("\"a\" {\n \"b\" \"c\"\n").unwrap_err();
        match err {
            SweepError::MalformedInput { line, column, .. } => {
                assert_eq!((line, column), (1, 5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_close() {
        assert!(matches!(
            parse("\"a\" \"b\" }"),
            Err(SweepError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse("\"a\" \"never closed"),
            Err(SweepError::MalformedInput { line: 1, column: 5, .. })
        ));
    }

    #[test]
    fn test_brace_where_key_expected() {
        assert!(matches!(
            parse("{ \"a\" \"b\" }"),
            Err(SweepError::MalformedInput { .. })
        ));
        assert!(matches!(
            parse("\"a\" { { } }"),
            Err(SweepError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_key_without_value() {
        assert!(parse("\"a\"").is_err());
        assert!(parse("\"a\" { \"b\" }").is_err());
    }
}
