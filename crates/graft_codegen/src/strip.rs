//! GraphQL ignored-character stripping.
//!
//! Hashes are taken over the stripped form of a document so that edits which
//! only touch whitespace, commas or comments keep their artifacts. Token
//! text, including every quoted string, is preserved byte for byte. Block
//! strings are reduced to their value (common indentation and blank edge
//! lines removed) and printed back in a minimal form.

/// Single-character punctuators. `...` is handled separately.
const PUNCTUATORS: &[char] = &['!', '$', '&', '(', ')', ':', '=', '@', '[', ']', '{', '|', '}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Punctuator,
    Spread,
    Word,
    String,
    BlockString,
}

/// Removes GraphQL ignored tokens while keeping the document's meaning.
///
/// Ignored tokens are the byte order mark, whitespace, line terminators,
/// commas and comments. A single space is kept between two adjacent
/// non-punctuator tokens and between a non-punctuator and a `...` spread.
/// Input that does not lex cleanly is still handled: unknown characters are
/// treated as part of a word and unterminated strings run to the end.
pub fn strip_ignored_characters(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last_was_word = false;

    for (kind, text) in Lexer::new(source) {
        let is_word = matches!(
            kind,
            TokenKind::Word | TokenKind::String | TokenKind::BlockString
        );
        if last_was_word && (is_word || kind == TokenKind::Spread) {
            out.push(' ');
        }
        if kind == TokenKind::BlockString {
            out.push_str(&print_block_string(&block_string_value(text)));
        } else {
            out.push_str(text);
        }
        last_was_word = is_word;
    }
    out
}

/// The value of a `"""` block string token.
///
/// Unescapes `\"""`, removes the indentation common to every non-blank line
/// after the first, and drops leading and trailing blank lines.
fn block_string_value(token: &str) -> String {
    let body = token.strip_prefix("\"\"\"").unwrap_or(token);
    let body = match body.strip_suffix("\"\"\"") {
        Some(inner) if !inner.ends_with('\\') => inner,
        _ => body,
    };
    let raw = body
        .replace("\\\"\"\"", "\"\"\"")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let lines: Vec<&str> = raw.split('\n').collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
            (indent < line.len()).then_some(indent)
        })
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                *line
            } else {
                line.get(common_indent..).unwrap_or("")
            }
        })
        .collect();

    let is_blank = |line: &&str| line.chars().all(|c| c == ' ' || c == '\t');
    let start = dedented.iter().position(|l| !is_blank(l)).unwrap_or(dedented.len());
    let end = dedented.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);
    dedented[start..end].join("\n")
}

/// Prints a block string value so that lexing it again yields the same value.
fn print_block_string(value: &str) -> String {
    let escaped = value.replace("\"\"\"", "\\\"\"\"");
    let leading_newline = value.contains('\n')
        && value
            .split('\n')
            .skip(1)
            .all(|line| line.is_empty() || line.starts_with([' ', '\t']));
    let trailing_newline = value.ends_with(['"', '\\']);

    let mut out = String::with_capacity(escaped.len() + 8);
    out.push_str("\"\"\"");
    if leading_newline {
        out.push('\n');
    }
    out.push_str(&escaped);
    if trailing_newline {
        out.push('\n');
    }
    out.push_str("\"\"\"");
    out
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ignored(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\u{feff}' | ' ' | '\t' | '\n' | '\r' | ',' => self.pos += c.len_utf8(),
                '#' => {
                    let end = self.rest().find(['\n', '\r']).unwrap_or(self.rest().len());
                    self.pos += end;
                }
                _ => break,
            }
        }
    }

    fn lex_block_string(&self) -> usize {
        let body = &self.rest()[3..];
        let mut i = 0;
        while i < body.len() {
            let tail = &body[i..];
            if tail.starts_with("\\\"\"\"") {
                i += 4;
            } else if tail.starts_with("\"\"\"") {
                return 3 + i + 3;
            } else {
                i += tail.chars().next().map_or(1, char::len_utf8);
            }
        }
        self.rest().len()
    }

    fn lex_string(&self) -> usize {
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => return i + 1,
                '\n' | '\r' => return i,
                _ => {}
            }
        }
        self.rest().len()
    }

    fn lex_word(&self) -> usize {
        let rest = self.rest();
        let numeric = rest.starts_with(|c: char| c.is_ascii_digit() || c == '-');
        rest.char_indices()
            .find(|&(_, c)| {
                c.is_whitespace()
                    || c == ','
                    || c == '#'
                    || c == '"'
                    || c == '\u{feff}'
                    || PUNCTUATORS.contains(&c)
                    || (c == '.' && !numeric)
            })
            .map_or(rest.len(), |(i, _)| i)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = (TokenKind, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_ignored();
        let c = self.peek()?;
        let rest = self.rest();

        let (kind, len) = if rest.starts_with("...") {
            (TokenKind::Spread, 3)
        } else if PUNCTUATORS.contains(&c) || c == '.' {
            (TokenKind::Punctuator, 1)
        } else if rest.starts_with("\"\"\"") {
            (TokenKind::BlockString, self.lex_block_string())
        } else if c == '"' {
            (TokenKind::String, self.lex_string())
        } else {
            (TokenKind::Word, self.lex_word().max(c.len_utf8()))
        };

        let text = &rest[..len];
        self.pos += len;
        Some((kind, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_around_punctuators() {
        assert_eq!(
            strip_ignored_characters("query Viewer { viewer { id name } }"),
            "query Viewer{viewer{id name}}"
        );
    }

    #[test]
    fn drops_comments_and_commas() {
        let src = "# leading\nquery A {\n  # inner\n  a, b,\n  c # trailing\n}\n";
        assert_eq!(strip_ignored_characters(src), "query A{a b c}");
    }

    #[test]
    fn keeps_space_before_spread_after_word() {
        assert_eq!(
            strip_ignored_characters("{ id ...ViewerFields ... on User { name } }"),
            "{id ...ViewerFields ...on User{name}}"
        );
        assert_eq!(strip_ignored_characters("{ ...A }"), "{...A}");
    }

    #[test]
    fn variables_and_arguments() {
        assert_eq!(
            strip_ignored_characters("query Q($id: ID!, $n: Int = 10) { node(id: $id) { id } }"),
            "query Q($id:ID!$n:Int=10){node(id:$id){id}}"
        );
    }

    #[test]
    fn preserves_string_contents() {
        assert_eq!(
            strip_ignored_characters(r#"{ f(a: "x ,  # y", b: "q\"r") }"#),
            r#"{f(a:"x ,  # y" b:"q\"r")}"#
        );
    }

    #[test]
    fn block_strings_reduce_to_their_value() {
        let src = "type A {\n  \"\"\"\n  Doc, with # stuff\n  \"\"\"\n  id: ID\n}";
        assert_eq!(
            strip_ignored_characters(src),
            "type A{\"\"\"Doc, with # stuff\"\"\" id:ID}"
        );
    }

    #[test]
    fn block_string_reindent_compares_equal() {
        let two = "type A {\n  \"\"\"\n  Doc line\n    nested\n  \"\"\"\n  id: ID\n}";
        let four = "type A {\n    \"\"\"\n    Doc line\n      nested\n    \"\"\"\n    id: ID\n}";
        assert_eq!(strip_ignored_characters(two), strip_ignored_characters(four));
        assert_eq!(
            strip_ignored_characters(two),
            "type A{\"\"\"\nDoc line\n  nested\"\"\" id:ID}"
        );
    }

    #[test]
    fn block_string_value_changes_are_kept() {
        let a = strip_ignored_characters("\"\"\"\n  Doc\n\"\"\" scalar S");
        let b = strip_ignored_characters("\"\"\"\n  Docs\n\"\"\" scalar S");
        assert_ne!(a, b);
    }

    #[test]
    fn block_string_escapes_and_edges_survive_restripping() {
        for src in [
            "\"\"\"a \\\"\"\" b\"\"\" scalar S",
            "\"\"\"first\n    indented\"\"\" scalar S",
            "\"\"\"\n  line\n    more\n\"\"\" scalar S",
            "\"\"\"say \"hi\"\n\"\"\" scalar S",
        ] {
            let once = strip_ignored_characters(src);
            assert_eq!(strip_ignored_characters(&once), once, "{src:?}");
        }
        assert_eq!(
            strip_ignored_characters("\"\"\"a \\\"\"\" b\"\"\""),
            "\"\"\"a \\\"\"\" b\"\"\""
        );
    }

    #[test]
    fn numbers_stay_whole() {
        assert_eq!(
            strip_ignored_characters("{ f(a: -1.5e3, b: 2) }"),
            "{f(a:-1.5e3 b:2)}"
        );
    }

    #[test]
    fn strips_bom() {
        assert_eq!(strip_ignored_characters("\u{feff}{ a }"), "{a}");
    }

    #[test]
    fn idempotent() {
        let src = "query Viewer {\n  viewer { id, ...F }\n}\nfragment F on User { name }";
        let once = strip_ignored_characters(src);
        assert_eq!(strip_ignored_characters(&once), once);
    }

    #[test]
    fn whitespace_only_edits_compare_equal() {
        let a = "query V { viewer { id } }";
        let b = "query V {\n\n  viewer {\n    id, # the id\n  }\n}\n";
        assert_eq!(strip_ignored_characters(a), strip_ignored_characters(b));
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(strip_ignored_characters("{ f(a: \"oops"), "{f(a:\"oops");
    }
}
