//! Tag and attribute scanner.
//!
//! Turns a character buffer into a stream of raw tokens: text runs, tag
//! records (name, open/close flags, attribute pairs), and skipped comment
//! or declaration spans. The scanner never fails; malformed spans are
//! re-emitted as prose text with a diagnostic, so downstream stages always
//! receive a complete token stream.
//!
//! Attribute values and text runs have their character references resolved
//! here (when enabled), so later stages only ever see decoded strings.

use heron_common::diagnostics::DiagnosticLog;

use crate::entities::decode_entities;

/// One attribute pair as scanned, value already entity-resolved.
///
/// Boolean attributes (no `=`) carry an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Attribute name as written.
    pub name: String,
    /// Decoded value; empty for boolean attributes.
    pub value: String,
}

/// A scanned tag record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    /// Tag name as written (case preserved for diagnostics).
    pub name: String,
    /// `</name>` form.
    pub closing: bool,
    /// `<name/>` form: opens and immediately closes.
    pub self_closing: bool,
    /// Attribute pairs in document order.
    pub attributes: Vec<RawAttribute>,
}

/// One token from the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    /// A run of prose text (entity-resolved when enabled).
    Text(String),
    /// A tag record.
    Tag(TagToken),
    /// A comment or `<!...>` declaration; carried for tracing, never
    /// enters the tree.
    Comment(String),
}

/// Cursor-based scanner over the input buffer.
pub struct Scanner {
    input: String,
    pos: usize,
    resolve_entities: bool,
    /// When set, the next token is a raw run ending at `</script`,
    /// with interior `<`/`>` not tag-parsed.
    raw_until_close: Option<&'static str>,
}

impl Scanner {
    /// Create a scanner over `input`. When `resolve_entities` is false,
    /// references pass through as literal text.
    #[must_use]
    pub fn new(input: impl Into<String>, resolve_entities: bool) -> Self {
        Self {
            input: input.into(),
            pos: 0,
            resolve_entities,
            raw_until_close: None,
        }
    }

    /// The byte offset of the next unread character.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }

    /// Peek at the character at the given offset without consuming.
    fn peek(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Consume the next input character.
    fn consume(&mut self) -> Option<char> {
        let c = self.remaining().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Check if the next few characters match `target`, ASCII
    /// case-insensitively. `target` must be ASCII.
    fn next_few_characters_are(&self, target: &str) -> bool {
        let rest = self.remaining().as_bytes();
        let pat = target.as_bytes();
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(char::is_whitespace) {
            let _ = self.consume();
        }
    }

    fn decode_if_enabled(&self, raw: &str, log: &mut DiagnosticLog) -> String {
        if self.resolve_entities {
            decode_entities(raw, log)
        } else {
            raw.to_string()
        }
    }

    /// Produce the next token, or None at end of input.
    pub fn next_token(&mut self, log: &mut DiagnosticLog) -> Option<RawToken> {
        if self.pos >= self.input.len() {
            return None;
        }

        if let Some(close_pattern) = self.raw_until_close.take() {
            return Some(self.scan_raw_region(close_pattern, log));
        }

        if self.peek(0) == Some('<') {
            // Comments and declarations are skipped whole.
            if self.peek(1) == Some('!') {
                return Some(self.scan_comment());
            }
            if let Some(tag) = self.scan_tag(log) {
                // A `<script>` open tag switches the scanner into raw
                // mode: everything up to `</script` is one text run with
                // interior angle brackets left alone.
                if !tag.closing && !tag.self_closing && tag.name.eq_ignore_ascii_case("script") {
                    self.raw_until_close = Some("</script");
                }
                return Some(RawToken::Tag(tag));
            }
            // Malformed tag start: the '<' is prose.
            let _ = self.consume();
            return Some(RawToken::Text("<".to_string()));
        }

        Some(self.scan_text(log))
    }

    /// Accumulate prose text up to the next `<` (or end of input).
    fn scan_text(&mut self, log: &mut DiagnosticLog) -> RawToken {
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c == '<' {
                break;
            }
            let _ = self.consume();
        }
        let raw = &self.input[start..self.pos];
        RawToken::Text(self.decode_if_enabled(raw, log))
    }

    /// Capture a raw region ending at `close_pattern` (exclusive), with no
    /// tag parsing of interior characters. References stay unresolved.
    fn scan_raw_region(&mut self, close_pattern: &str, log: &mut DiagnosticLog) -> RawToken {
        let start = self.pos;
        while self.pos < self.input.len() && !self.next_few_characters_are(close_pattern) {
            let _ = self.consume();
        }
        if self.pos >= self.input.len() {
            log.warning(format!(
                "unterminated raw region (missing '{close_pattern}')"
            ));
        }
        RawToken::Text(self.input[start..self.pos].to_string())
    }

    /// Skip `<!-- ... -->` comments and `<!...>` declarations.
    fn scan_comment(&mut self) -> RawToken {
        let start = self.pos;
        if self.next_few_characters_are("<!--") {
            self.pos += 4;
            while self.pos < self.input.len() && !self.next_few_characters_are("-->") {
                let _ = self.consume();
            }
            self.pos = (self.pos + 3).min(self.input.len());
        } else {
            while let Some(c) = self.consume() {
                if c == '>' {
                    break;
                }
            }
        }
        RawToken::Comment(self.input[start..self.pos].to_string())
    }

    /// Scan a full tag starting at `<`. Returns None (position restored)
    /// when what follows cannot be a tag, so the caller can re-emit the
    /// span as prose.
    fn scan_tag(&mut self, log: &mut DiagnosticLog) -> Option<TagToken> {
        let start = self.pos;
        let _ = self.consume(); // '<'

        let closing = if self.peek(0) == Some('/') {
            let _ = self.consume();
            true
        } else {
            false
        };

        // A tag name starts with an alphabetic character; anything else
        // means this '<' was prose.
        if !self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos = start;
            return None;
        }

        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            name.push(c);
            let _ = self.consume();
        }

        let mut tag = TagToken {
            name,
            closing,
            self_closing: false,
            attributes: Vec::new(),
        };

        loop {
            self.skip_whitespace();
            match self.peek(0) {
                None => {
                    log.warning(format!("unterminated tag '<{}'", tag.name));
                    return Some(tag);
                }
                Some('>') => {
                    let _ = self.consume();
                    return Some(tag);
                }
                Some('/') if self.peek(1) == Some('>') => {
                    let _ = self.consume();
                    let _ = self.consume();
                    tag.self_closing = true;
                    return Some(tag);
                }
                Some(other) => match self.scan_attribute(log) {
                    Some(attr) => tag.attributes.push(attr),
                    None => {
                        // Not an attribute: drop one character and keep
                        // scanning so a stray symbol cannot stall the tag.
                        let _ = self.consume();
                        log.error(format!(
                            "expected attribute in '<{}', found '{other}'",
                            tag.name
                        ));
                    }
                },
            }
        }
    }

    /// Scan one attribute: a name, optionally `=` and a quoted or bare
    /// value. Returns None ("not an attribute") when the first
    /// non-whitespace character is not alphabetic.
    fn scan_attribute(&mut self, log: &mut DiagnosticLog) -> Option<RawAttribute> {
        self.skip_whitespace();

        if !self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        // Name runs up to the next separator: whitespace, '=', '>', '/'.
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            name.push(c);
            let _ = self.consume();
        }

        self.skip_whitespace();
        if self.peek(0) != Some('=') {
            // Boolean attribute: name only.
            return Some(RawAttribute {
                name,
                value: String::new(),
            });
        }
        let _ = self.consume(); // '='
        self.skip_whitespace();

        let raw_value = match self.peek(0) {
            Some(quote @ ('"' | '\'')) => {
                let _ = self.consume();
                let start = self.pos;
                while let Some(c) = self.peek(0) {
                    if c == quote {
                        break;
                    }
                    let _ = self.consume();
                }
                let value = self.input[start..self.pos].to_string();
                if self.peek(0) == Some(quote) {
                    let _ = self.consume();
                } else {
                    log.warning(format!("unterminated quoted value for '{name}'"));
                }
                value
            }
            _ => {
                // Bare value: up to whitespace or a tag-ending delimiter.
                let start = self.pos;
                while let Some(c) = self.peek(0) {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    if c == '/' && self.peek(1) == Some('>') {
                        break;
                    }
                    let _ = self.consume();
                }
                self.input[start..self.pos].to_string()
            }
        };

        let value = self.decode_if_enabled(&raw_value, log);
        Some(RawAttribute { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &str) -> (Vec<RawToken>, DiagnosticLog) {
        let mut scanner = Scanner::new(input, true);
        let mut log = DiagnosticLog::new();
        let mut tokens = Vec::new();
        while let Some(token) = scanner.next_token(&mut log) {
            tokens.push(token);
        }
        (tokens, log)
    }

    fn tag(tokens: &[RawToken], index: usize) -> &TagToken {
        match &tokens[index] {
            RawToken::Tag(t) => t,
            other => panic!("expected tag at {index}, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_tag_with_attributes() {
        let (tokens, log) = scan_all(r#"<a href="x.html" target=_blank>go</a>"#);
        assert!(log.is_empty());

        let open = tag(&tokens, 0);
        assert_eq!(open.name, "a");
        assert!(!open.closing);
        assert_eq!(open.attributes.len(), 2);
        assert_eq!(open.attributes[0].name, "href");
        assert_eq!(open.attributes[0].value, "x.html");
        assert_eq!(open.attributes[1].value, "_blank");

        assert_eq!(tokens[1], RawToken::Text("go".to_string()));
        assert!(tag(&tokens, 2).closing);
    }

    #[test]
    fn test_boolean_attribute() {
        let (tokens, _) = scan_all("<table noborder>");
        let t = tag(&tokens, 0);
        assert_eq!(t.attributes[0].name, "noborder");
        assert_eq!(t.attributes[0].value, "");
    }

    #[test]
    fn test_self_closing() {
        let (tokens, _) = scan_all("<br/><img src=x.png />");
        assert!(tag(&tokens, 0).self_closing);
        let img = tag(&tokens, 1);
        assert!(img.self_closing);
        assert_eq!(img.attributes[0].value, "x.png");
    }

    #[test]
    fn test_single_quoted_value_with_entities() {
        let (tokens, _) = scan_all("<p title='a &amp; b'>");
        assert_eq!(tag(&tokens, 0).attributes[0].value, "a & b");
    }

    #[test]
    fn test_stray_angle_is_prose() {
        let (tokens, _) = scan_all("1 < 2");
        let text: String = tokens
            .iter()
            .map(|t| match t {
                RawToken::Text(s) => s.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "1 < 2");
    }

    #[test]
    fn test_script_region_not_tag_parsed() {
        let (tokens, log) = scan_all("<script>if (a<b) { x = y > z; }</script>after");
        assert!(log.is_empty());
        assert_eq!(tag(&tokens, 0).name, "script");
        assert_eq!(
            tokens[1],
            RawToken::Text("if (a<b) { x = y > z; }".to_string())
        );
        assert!(tag(&tokens, 2).closing);
        assert_eq!(tokens[3], RawToken::Text("after".to_string()));
    }

    #[test]
    fn test_comment_skipped() {
        let (tokens, _) = scan_all("a<!-- <p>not a tag</p> -->b");
        assert_eq!(tokens[0], RawToken::Text("a".to_string()));
        assert!(matches!(tokens[1], RawToken::Comment(_)));
        assert_eq!(tokens[2], RawToken::Text("b".to_string()));
    }

    #[test]
    fn test_unterminated_tag_reported() {
        let (tokens, log) = scan_all("<p class=");
        assert_eq!(tag(&tokens, 0).name, "p");
        assert!(!log.is_empty());
    }
}
