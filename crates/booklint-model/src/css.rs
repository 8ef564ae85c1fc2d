//! Stylesheet parsing: rules, declarations, `@media` and `@namespace`.
//!
//! This is a rule-level parser, not a full CSS tokenizer. It understands
//! comments, strings and nested blocks well enough to split a stylesheet
//! into style rules with compiled selectors.

use crate::selector::{self, CompiledSelector};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct CssError {
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub property: String,
    pub value: String,
    pub important: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    /// Selector list as written (whitespace-normalized), or the at-rule name
    /// (`@font-face`) for descriptor blocks.
    pub selector_text: String,
    /// Empty for at-rule blocks such as `@font-face`.
    pub selectors: Vec<CompiledSelector>,
    pub declarations: Vec<Declaration>,
    pub line: u32,
    /// Enclosing `@media`/`@supports` prelude, if any.
    pub media: Option<String>,
}

impl CssRule {
    pub fn declaration(&self, property: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.property == property)
    }

    pub fn is_at_rule(&self) -> bool {
        self.selector_text.starts_with('@')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

/// A parsed stylesheet. Selectors are compiled once, here.
#[derive(Debug, Clone)]
pub struct ParsedCss {
    path: String,
    source: String,
    rules: Vec<CssRule>,
    namespaces: Vec<NamespaceDecl>,
    imports: Vec<String>,
}

impl ParsedCss {
    pub fn parse(path: impl Into<String>, source: impl Into<String>) -> Result<Self, CssError> {
        let mut source = source.into();
        if source.starts_with('\u{feff}') {
            source.drain(..'\u{feff}'.len_utf8());
        }
        let stripped = strip_comments(&source)?;
        let mut parser = BlockParser {
            text: &stripped,
            bytes: stripped.as_bytes(),
            pos: 0,
            lines: line_starts(&stripped),
            rules: Vec::new(),
            namespaces: Vec::new(),
            imports: Vec::new(),
        };
        parser.parse_block(None, false)?;
        let BlockParser {
            rules,
            namespaces,
            imports,
            ..
        } = parser;
        Ok(ParsedCss {
            path: path.into(),
            source,
            rules,
            namespaces,
            imports,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Rules in source order, with `@media` blocks flattened.
    pub fn rules(&self) -> &[CssRule] {
        &self.rules
    }

    pub fn style_rules(&self) -> impl Iterator<Item = &CssRule> {
        self.rules.iter().filter(|rule| !rule.is_at_rule())
    }

    pub fn namespaces(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|ns| ns.prefix.as_deref() == Some(prefix))
            .map(|ns| ns.uri.as_str())
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }
}

/// Replaces comments with spaces, keeping byte offsets and newlines intact.
fn strip_comments(source: &str) -> Result<String, CssError> {
    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && i + 1 < bytes.len() {
                    out.extend_from_slice(&bytes[i..i + 2]);
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                out.push(b);
                i += 1;
            }
            None if b == b'"' || b == b'\'' => {
                quote = Some(b);
                out.push(b);
                i += 1;
            }
            None if b == b'/' && bytes.get(i + 1) == Some(&b'*') => {
                let start = i;
                let Some(len) = source[i + 2..].find("*/") else {
                    let line = line_of(source, start);
                    return Err(CssError {
                        line,
                        message: "unterminated comment".to_string(),
                    });
                };
                let end = i + 2 + len + 2;
                out.extend(
                    bytes[start..end]
                        .iter()
                        .map(|&c| if c == b'\n' { b'\n' } else { b' ' }),
                );
                i = end;
            }
            None => {
                out.push(b);
                i += 1;
            }
        }
    }
    // Whole comments were replaced byte for byte, so this cannot split a character.
    String::from_utf8(out).map_err(|err| CssError {
        line: 1,
        message: err.to_string(),
    })
}

fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
    starts
}

fn line_of(text: &str, offset: usize) -> u32 {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count() as u32
        + 1
}

struct BlockParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lines: Vec<usize>,
    rules: Vec<CssRule>,
    namespaces: Vec<NamespaceDecl>,
    imports: Vec<String>,
}

/// What ended a scanned prelude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Semicolon,
    OpenBrace,
    CloseBrace,
    Eof,
}

impl<'a> BlockParser<'a> {
    fn line_at(&self, offset: usize) -> u32 {
        self.lines.partition_point(|&start| start <= offset) as u32
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> CssError {
        CssError {
            line: self.line_at(offset),
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Scans forward to the next top-level `;`, `{` or `}`; returns the text
    /// before it and what stopped the scan. The stop byte is consumed.
    fn scan_prelude(&mut self) -> (&'a str, Stop) {
        let start = self.pos;
        let mut quote: Option<u8> = None;
        let mut depth = 0i32;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if let Some(q) = quote {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == q {
                    quote = None;
                }
                self.pos += 1;
                continue;
            }
            let stop = match b {
                b'"' | b'\'' => {
                    quote = Some(b);
                    None
                }
                b'(' | b'[' => {
                    depth += 1;
                    None
                }
                b')' | b']' => {
                    depth -= 1;
                    None
                }
                b';' if depth <= 0 => Some(Stop::Semicolon),
                b'{' => Some(Stop::OpenBrace),
                b'}' => Some(Stop::CloseBrace),
                _ => None,
            };
            if let Some(stop) = stop {
                let text = &self.text[start..self.pos];
                self.pos += 1;
                return (text, stop);
            }
            self.pos += 1;
        }
        let end = self.pos.min(self.text.len());
        (&self.text[start..end], Stop::Eof)
    }

    /// Parses rules until EOF (top level) or the closing brace of a block.
    fn parse_block(&mut self, media: Option<String>, nested: bool) -> Result<(), CssError> {
        loop {
            self.skip_ws();
            let start = self.pos;
            if self.pos >= self.bytes.len() {
                if nested {
                    return Err(self.error(start, "unclosed block"));
                }
                return Ok(());
            }

            let (prelude, stop) = self.scan_prelude();
            let prelude = prelude.trim();
            match stop {
                Stop::CloseBrace if prelude.is_empty() => {
                    if nested {
                        return Ok(());
                    }
                    return Err(self.error(start, "unexpected `}`"));
                }
                Stop::Semicolon if prelude.starts_with('@') => self.statement_at_rule(prelude),
                Stop::Semicolon if prelude.is_empty() => {}
                Stop::OpenBrace if prelude.starts_with('@') => {
                    self.block_at_rule(prelude, start, media.as_deref())?;
                }
                Stop::OpenBrace if prelude.is_empty() => {
                    return Err(self.error(start, "missing selector before `{`"));
                }
                Stop::OpenBrace => {
                    let declarations = self.parse_declarations()?;
                    let selector_text = normalize(prelude);
                    self.rules.push(CssRule {
                        selectors: selector::compile_list(&selector_text),
                        selector_text,
                        declarations,
                        line: self.line_at(start),
                        media: media.clone(),
                    });
                }
                Stop::Eof => {
                    return Err(self.error(start, format!("expected `{{` after `{prelude}`")));
                }
                Stop::Semicolon | Stop::CloseBrace => {
                    return Err(self.error(start, format!("unexpected end of rule `{prelude}`")));
                }
            }
        }
    }

    fn statement_at_rule(&mut self, prelude: &str) {
        let (name, rest) = split_at_keyword(prelude);
        match name.as_str() {
            "namespace" => {
                let mut parts = rest.split_whitespace();
                let first = parts.next().unwrap_or("");
                let (prefix, uri) = match parts.next() {
                    Some(uri) => (Some(first.to_string()), uri),
                    None => (None, first),
                };
                self.namespaces.push(NamespaceDecl {
                    prefix,
                    uri: unquote(uri),
                });
            }
            "import" => self.imports.push(unquote(rest.trim())),
            _ => {}
        }
    }

    fn block_at_rule(
        &mut self,
        prelude: &str,
        start: usize,
        outer_media: Option<&str>,
    ) -> Result<(), CssError> {
        let (name, rest) = split_at_keyword(prelude);
        match name.as_str() {
            "media" | "supports" => {
                let query = normalize(rest);
                let media = match outer_media {
                    Some(outer) => format!("{outer} and {query}"),
                    None => query,
                };
                self.parse_block(Some(media), true)
            }
            "font-face" | "page" => {
                let declarations = self.parse_declarations()?;
                self.rules.push(CssRule {
                    selector_text: format!("@{name}"),
                    selectors: Vec::new(),
                    declarations,
                    line: self.line_at(start),
                    media: outer_media.map(str::to_string),
                });
                Ok(())
            }
            _ => self.skip_balanced(start),
        }
    }

    /// Skips the body of an unknown block at-rule (`@keyframes`).
    fn skip_balanced(&mut self, start: usize) -> Result<(), CssError> {
        let mut depth = 1;
        while depth > 0 {
            let (_, stop) = self.scan_prelude();
            match stop {
                Stop::OpenBrace => depth += 1,
                Stop::CloseBrace => depth -= 1,
                Stop::Semicolon => {}
                Stop::Eof => return Err(self.error(start, "unclosed block")),
            }
        }
        Ok(())
    }

    fn parse_declarations(&mut self) -> Result<Vec<Declaration>, CssError> {
        let block_start = self.pos;
        let mut declarations = Vec::new();
        loop {
            self.skip_ws();
            let start = self.pos;
            let (text, stop) = self.scan_prelude();
            let text = text.trim();
            if !text.is_empty() {
                declarations.push(self.declaration(text, start)?);
            }
            match stop {
                Stop::Semicolon => {}
                Stop::CloseBrace => return Ok(declarations),
                Stop::OpenBrace => {
                    return Err(self.error(start, "nested block inside declarations"));
                }
                Stop::Eof => return Err(self.error(block_start, "unclosed block")),
            }
        }
    }

    fn declaration(&self, text: &str, offset: usize) -> Result<Declaration, CssError> {
        let Some((property, value)) = text.split_once(':') else {
            return Err(self.error(offset, format!("declaration without `:`: `{text}`")));
        };
        let property = property.trim().to_ascii_lowercase();
        if property.is_empty() {
            return Err(self.error(offset, format!("declaration without property: `{text}`")));
        }
        let mut value = value.trim();
        let mut important = false;
        if let Some(bang) = value.rfind('!') {
            if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
                important = true;
                value = value[..bang].trim_end();
            }
        }
        Ok(Declaration {
            property,
            value: value.to_string(),
            important,
            line: self.line_at(offset),
        })
    }
}

fn split_at_keyword(prelude: &str) -> (String, &str) {
    let body = prelude.trim_start_matches('@');
    let end = body
        .find(|c: char| c.is_whitespace() || c == '(' || c == '"' || c == '\'')
        .unwrap_or(body.len());
    (body[..end].to_ascii_lowercase(), body[end..].trim())
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    let text = text
        .strip_prefix("url(")
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text)
        .trim();
    text.trim_matches(|c| c == '"' || c == '\'').to_string()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
