//! Twig tag parsing.
//!
//! Only `{% ... %}` tags are looked at. Each tag body is tokenized with a
//! logos lexer and its leading expression parsed into the shared `Expr`
//! tree, so template names can be recovered with the literal extractor.
//! The expression parser tolerates missing operands everywhere: editors
//! hand us half-typed templates.

use crate::literals::extract_literals;
use formscope_types::{ArrayElement, Expr, ExprKind, Range, TwigBlock};
use indexmap::IndexSet;
use logos::Logos;

/// A `{% name expr ... %}` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwigTag {
    pub name: String,
    pub name_range: Range,
    /// The expression directly following the tag name, if any.
    pub expr: Option<Expr>,
    /// From `{%` to `%}` inclusive.
    pub range: Range,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token {
    #[regex(r"'([^'\\]|\\.)*'")]
    SingleQuoted,
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Name,
    #[token("??")]
    Coalesce,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("~")]
    Tilde,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[regex(r"[=!<>+\-*/%]+")]
    Operator,
}

/// Word operators that join two operands.
const BINARY_WORDS: &[&str] = &["and", "or", "in", "is", "not", "matches", "starts", "ends"];

/// Byte offset to line/column conversion.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex { starts }
    }

    fn position(&self, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&s| s <= offset) - 1;
        (line as u32, (offset - self.starts[line]) as u32)
    }

    fn range(&self, start: usize, end: usize) -> Range {
        let (start_line, start_col) = self.position(start);
        let (end_line, end_col) = self.position(end);
        (start_line, start_col, end_line, end_col)
    }
}

/// Every tag of a template, in source order. `{# comments #}` are skipped.
pub fn tags_in_file(source: &str) -> Vec<TwigTag> {
    let lines = LineIndex::new(source);
    let mut tags = Vec::new();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find('{') {
        let open = cursor + found;
        let rest = &source[open..];

        if rest.starts_with("{#") {
            match source[open + 2..].find("#}") {
                Some(end) => cursor = open + 2 + end + 2,
                None => break,
            }
            continue;
        }
        if !rest.starts_with("{%") {
            cursor = open + 1;
            continue;
        }

        let Some(close_rel) = source[open + 2..].find("%}") else {
            break;
        };
        let close = open + 2 + close_rel;

        // Whitespace control: `{%-`, `{%~`, `-%}`, `~%}`
        let mut body_start = open + 2;
        let mut body_end = close;
        if source[body_start..body_end].starts_with(['-', '~']) {
            body_start += 1;
        }
        if body_end > body_start && source[body_start..body_end].ends_with(['-', '~']) {
            body_end -= 1;
        }

        if let Some(tag) = parse_tag_body(source, body_start, body_end, &lines) {
            tags.push(TwigTag {
                range: lines.range(open, close + 2),
                ..tag
            });
        }
        cursor = close + 2;
    }

    tags
}

/// Parse the first tag found in `source`.
pub fn parse_tag(source: &str) -> Option<TwigTag> {
    tags_in_file(source).into_iter().next()
}

/// Template names of an `extends` tag.
pub fn extends_tag_templates(tag: &TwigTag) -> IndexSet<String> {
    if tag.name != "extends" {
        return IndexSet::new();
    }
    tag_templates(tag)
}

/// Template names of an `include` or `embed` tag.
pub fn include_tag_templates(tag: &TwigTag) -> IndexSet<String> {
    if tag.name != "include" && tag.name != "embed" {
        return IndexSet::new();
    }
    tag_templates(tag)
}

fn tag_templates(tag: &TwigTag) -> IndexSet<String> {
    match &tag.expr {
        Some(expr) => extract_literals(expr)
            .into_iter()
            .filter(|name| !name.trim().is_empty())
            .collect(),
        None => IndexSet::new(),
    }
}

/// Blocks declared in a template.
pub fn blocks_in_file(source: &str, uri: &str) -> Vec<TwigBlock> {
    tags_in_file(source)
        .into_iter()
        .filter(|tag| tag.name == "block")
        .filter_map(|tag| {
            let expr = tag.expr?;
            let name = match &expr.kind {
                ExprKind::Name(name) | ExprKind::String(name) => name.trim().to_string(),
                _ => return None,
            };
            if name.is_empty() {
                return None;
            }
            Some(TwigBlock {
                name,
                uri: uri.to_string(),
                range: expr.range,
            })
        })
        .collect()
}

fn parse_tag_body(source: &str, start: usize, end: usize, lines: &LineIndex) -> Option<TwigTag> {
    let text = &source[start..end];
    let lexemes: Vec<Lexeme> = Token::lexer(text)
        .spanned()
        .map(|(token, span)| Lexeme {
            token: token.ok(),
            start: span.start,
            end: span.end,
        })
        .collect();

    let first = lexemes.first()?;
    if first.token != Some(Token::Name) {
        return None;
    }
    let name = text[first.start..first.end].to_string();
    let name_range = lines.range(start + first.start, start + first.end);

    let mut parser = ExprParser {
        text,
        lexemes: &lexemes,
        pos: 1,
        base: start,
        lines,
    };
    let expr = parser.expression();

    Some(TwigTag {
        name,
        name_range,
        expr,
        range: lines.range(start, end),
    })
}

struct Lexeme {
    /// `None` for input the lexer could not match.
    token: Option<Token>,
    start: usize,
    end: usize,
}

struct ExprParser<'a> {
    text: &'a str,
    lexemes: &'a [Lexeme],
    pos: usize,
    base: usize,
    lines: &'a LineIndex,
}

impl<'a> ExprParser<'a> {
    // ---- token helpers ----

    fn peek(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn at(&self, token: Token) -> bool {
        self.peek().is_some_and(|l| l.token == Some(token))
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) {
        if self.pos < self.lexemes.len() {
            self.pos += 1;
        }
    }

    fn text_of(&self, lexeme: &Lexeme) -> &'a str {
        &self.text[lexeme.start..lexeme.end]
    }

    fn at_word(&self, words: &[&str]) -> bool {
        self.peek().is_some_and(|l| {
            l.token == Some(Token::Name) && words.contains(&self.text_of(l))
        })
    }

    fn eat_word(&mut self, words: &[&str]) -> bool {
        if self.at_word(words) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Start offset of the current token.
    fn here(&self) -> usize {
        self.peek().map_or(self.text.len(), |l| l.start)
    }

    /// End offset of the last consumed token.
    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.lexemes.get(i))
            .map_or(0, |l| l.end)
    }

    fn range(&self, start: usize, end: usize) -> Range {
        self.lines
            .range(self.base + start, self.base + end.max(start))
    }

    fn node(&self, kind: ExprKind, start: usize) -> Expr {
        Expr::new(kind, self.range(start, self.last_end()))
    }

    fn missing(&self) -> Expr {
        let at = self.here();
        Expr::missing(self.range(at, at))
    }

    // ---- grammar ----

    fn expression(&mut self) -> Option<Expr> {
        let start = self.here();
        let condition = self.binary();
        if !self.eat(Token::Question) {
            return condition;
        }

        let then = if self.at(Token::Colon) {
            // `a ?: b`
            condition.clone()
        } else {
            self.expression()
        };
        let otherwise = if self.eat(Token::Colon) {
            self.expression()
        } else {
            None
        };

        Some(self.node(
            ExprKind::Ternary {
                condition: condition.map(Box::new),
                then: then.map(Box::new),
                otherwise: otherwise.map(Box::new),
            },
            start,
        ))
    }

    fn binary(&mut self) -> Option<Expr> {
        let start = self.here();
        let mut left = self.concat();
        while self.eat_binary_operator() {
            let right = self.concat();
            let children = [left, right].into_iter().flatten().collect();
            left = Some(self.node(ExprKind::Other(children), start));
        }
        left
    }

    fn eat_binary_operator(&mut self) -> bool {
        if self.eat(Token::Operator) || self.eat(Token::Coalesce) {
            return true;
        }
        if self.eat_word(&["starts", "ends"]) {
            self.eat_word(&["with"]);
            return true;
        }
        if self.eat_word(BINARY_WORDS) {
            // `is not`, `not in`
            self.eat_word(&["not", "in"]);
            return true;
        }
        false
    }

    fn concat(&mut self) -> Option<Expr> {
        let start = self.here();
        let first = self.unary();
        if !self.at(Token::Tilde) {
            return first;
        }

        let mut parts = vec![first.unwrap_or_else(|| self.missing())];
        while self.eat(Token::Tilde) {
            let part = self.unary().unwrap_or_else(|| self.missing());
            parts.push(part);
        }
        Some(self.node(ExprKind::Concat(parts), start))
    }

    fn unary(&mut self) -> Option<Expr> {
        let start = self.here();
        if self.eat_word(&["not"]) || self.eat(Token::Operator) {
            let operand = self.unary();
            return Some(self.node(ExprKind::Other(operand.into_iter().collect()), start));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Option<Expr> {
        let start = self.here();
        let mut expr = self.primary()?;

        loop {
            if self.eat(Token::Dot) {
                // attribute name or numeric index
                if self.at(Token::Name) || self.at(Token::Number) {
                    self.bump();
                }
                expr = self.node(ExprKind::Other(vec![expr]), start);
            } else if self.at(Token::LParen) {
                let mut children = vec![expr];
                children.extend(self.arguments());
                expr = self.node(ExprKind::Other(children), start);
            } else if self.eat(Token::LBracket) {
                let mut children = vec![expr];
                children.extend(self.expression());
                if self.eat(Token::Colon) {
                    children.extend(self.expression());
                }
                self.eat(Token::RBracket);
                expr = self.node(ExprKind::Other(children), start);
            } else if self.eat(Token::Pipe) {
                self.eat(Token::Name);
                let mut children = vec![expr];
                if self.at(Token::LParen) {
                    children.extend(self.arguments());
                }
                expr = self.node(ExprKind::Other(children), start);
            } else {
                break;
            }
        }

        Some(expr)
    }

    /// `( a, b, name: c )`; the cursor is on `(`.
    fn arguments(&mut self) -> Vec<Expr> {
        self.bump();
        let mut args = Vec::new();
        while let Some(lexeme) = self.peek() {
            match lexeme.token {
                Some(Token::RParen) => {
                    self.bump();
                    break;
                }
                Some(Token::Comma) => self.bump(),
                _ => match self.expression() {
                    Some(arg) => args.push(arg),
                    None => self.bump(),
                },
            }
        }
        args
    }

    fn primary(&mut self) -> Option<Expr> {
        let lexeme = self.peek()?;
        let start = lexeme.start;
        let text = self.text_of(lexeme);

        let kind = match lexeme.token {
            Some(Token::SingleQuoted) => {
                self.bump();
                ExprKind::String(unquote(text))
            }
            Some(Token::DoubleQuoted) => {
                self.bump();
                if text.contains("#{") {
                    // interpolated
                    ExprKind::Other(Vec::new())
                } else {
                    ExprKind::String(unquote(text))
                }
            }
            Some(Token::Number) => {
                self.bump();
                ExprKind::Scalar(text.to_string())
            }
            Some(Token::Name) => {
                self.bump();
                match text.to_ascii_lowercase().as_str() {
                    "true" | "false" | "null" | "none" => ExprKind::Scalar(text.to_string()),
                    _ => ExprKind::Name(text.to_string()),
                }
            }
            Some(Token::LParen) => {
                self.bump();
                let inner = self.expression();
                self.eat(Token::RParen);
                return Some(inner.unwrap_or_else(|| self.node(ExprKind::Missing, start)));
            }
            Some(Token::LBracket) => return Some(self.list()),
            Some(Token::LBrace) => return Some(self.hash()),
            None => {
                self.bump();
                ExprKind::Other(Vec::new())
            }
            _ => return None,
        };

        Some(self.node(kind, start))
    }

    /// `[a, , b]`; an empty slot becomes an element without a value.
    fn list(&mut self) -> Expr {
        let start = self.here();
        self.bump();
        let mut elements = Vec::new();

        while let Some(lexeme) = self.peek() {
            match lexeme.token {
                Some(Token::RBracket) => {
                    self.bump();
                    break;
                }
                Some(Token::Comma) => {
                    elements.push(ArrayElement {
                        key: None,
                        value: None,
                        range: self.range(lexeme.start, lexeme.start),
                    });
                    self.bump();
                }
                _ => {
                    let element_start = lexeme.start;
                    match self.expression() {
                        Some(value) => {
                            elements.push(ArrayElement {
                                key: None,
                                value: Some(value),
                                range: self.range(element_start, self.last_end()),
                            });
                            self.eat(Token::Comma);
                        }
                        None => self.bump(),
                    }
                }
            }
        }

        self.node(ExprKind::Array(elements), start)
    }

    /// `{ key: value, 'other': value }`
    fn hash(&mut self) -> Expr {
        let start = self.here();
        self.bump();
        let mut elements = Vec::new();

        while let Some(lexeme) = self.peek() {
            let element_start = lexeme.start;
            let key = match lexeme.token {
                Some(Token::RBrace) => {
                    self.bump();
                    break;
                }
                Some(Token::Comma) => {
                    self.bump();
                    continue;
                }
                Some(Token::Name) => {
                    let name = self.text_of(lexeme).to_string();
                    self.bump();
                    self.node(ExprKind::String(name), element_start)
                }
                Some(Token::SingleQuoted | Token::DoubleQuoted | Token::Number | Token::LParen) => {
                    match self.primary() {
                        Some(key) => key,
                        None => continue,
                    }
                }
                _ => {
                    self.bump();
                    continue;
                }
            };

            let value = if self.eat(Token::Colon) {
                self.expression()
            } else {
                None
            };
            elements.push(ArrayElement {
                key: Some(key),
                value,
                range: self.range(element_start, self.last_end()),
            });
        }

        self.node(ExprKind::Array(elements), start)
    }
}

/// Strip the quotes of a string token and decode `\\` and escaped quotes.
fn unquote(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('\\' | '\'' | '"')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extends(source: &str) -> Vec<String> {
        parse_tag(source)
            .map(|tag| extends_tag_templates(&tag).into_iter().collect())
            .unwrap_or_default()
    }

    fn includes(source: &str) -> Vec<String> {
        parse_tag(source)
            .map(|tag| include_tag_templates(&tag).into_iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_extends_quoted() {
        assert_eq!(extends("{% extends 'foo.html.twig' %}"), vec!["foo.html.twig"]);
        assert_eq!(extends("{% extends \"foo.html.twig\" %}"), vec!["foo.html.twig"]);
        assert_eq!(extends("{%extends \"foo.html.twig\"%}"), vec!["foo.html.twig"]);
        assert_eq!(extends("{%- extends 'foo.html.twig' -%}"), vec!["foo.html.twig"]);
    }

    #[test]
    fn test_extends_invalid() {
        assert!(extends("{% extends ~ 'foo.html.twig' %}").is_empty());
        assert!(extends("{% extends foo ~ 'foo.html.twig' %}").is_empty());
        assert!(extends("{% extends '' %}").is_empty());
        assert!(extends("{% extends '   ' %}").is_empty());
        assert!(extends("{% extends %}").is_empty());
    }

    #[test]
    fn test_extends_ternary() {
        assert_eq!(
            extends("{% extends request.ajax ? foo ~ \"foo_1.html.twig\" : \"foo_2.html.twig\" %}"),
            vec!["foo_2.html.twig"]
        );
        assert_eq!(
            extends("{% extends request.ajax ? \"foo_1.html.twig\" : ~ \"foo_2.html.twig\" %}"),
            vec!["foo_1.html.twig"]
        );
        assert_eq!(
            extends("{% extends request.ajax ? 'a.html.twig' : 'b.html.twig' %}"),
            vec!["a.html.twig", "b.html.twig"]
        );
    }

    #[test]
    fn test_extends_literal_concatenation() {
        assert_eq!(extends("{% extends 'foo' ~ '.html.twig' %}"), vec!["foo.html.twig"]);
    }

    #[test]
    fn test_extends_on_other_tag() {
        assert!(extends("{% include 'foo.html.twig' %}").is_empty());
    }

    #[test]
    fn test_include_array_with_missing_elements() {
        assert_eq!(
            includes("{% include ['foo_1.html.twig', , 'foo_2.html.twig'] %}"),
            vec!["foo_1.html.twig", "foo_2.html.twig"]
        );
        assert_eq!(
            includes("{% include ['foo_3.html.twig', foo ~ 'x.html.twig', 'foo_4.html.twig',] %}"),
            vec!["foo_3.html.twig", "foo_4.html.twig"]
        );
    }

    #[test]
    fn test_include_with_arguments() {
        assert_eq!(
            includes("{% include 'foo.html.twig' with {'bar': 'baz'} only %}"),
            vec!["foo.html.twig"]
        );
        assert_eq!(
            includes("{% embed 'card.html.twig' ignore missing %}"),
            vec!["card.html.twig"]
        );
    }

    #[test]
    fn test_import_and_from_are_not_includes() {
        assert!(includes("{% import 'forms.html.twig' as forms %}").is_empty());
        assert!(includes("{% from 'forms.html.twig' import input %}").is_empty());
    }

    #[test]
    fn test_blocks_in_file() {
        let source = "{% block foo %}{% endblock %}\n{% block \"bar\" %}{% endblock %}\n{%- block 'baz' -%}{% endblock %}\n";
        let blocks = blocks_in_file(source, "file:///base.html.twig");
        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);
        assert_eq!(blocks[1].range.0, 1);
        assert_eq!(blocks[0].uri, "file:///base.html.twig");
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "{# {% block hidden %} #}{% block shown %}{% endblock %}";
        let blocks = blocks_in_file(source, "file:///t.html.twig");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "shown");
    }

    #[test]
    fn test_tag_ranges() {
        let tags = tags_in_file("<div>\n  {% extends 'a.html.twig' %}\n</div>");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "extends");
        assert_eq!(tags[0].range, (1, 2, 1, 29));
        assert_eq!(tags[0].name_range, (1, 5, 1, 12));
    }

    #[test]
    fn test_unterminated_input() {
        assert!(parse_tag("{% extends 'foo.html.twig'").is_none());
        assert!(extends("{% extends 'foo.html.twig %}").is_empty());
        assert_eq!(includes("{% include ['a.html.twig', %}"), vec!["a.html.twig"]);
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote(r#""a\\b""#), "a\\b");
        assert_eq!(unquote(r"'a\nb'"), "a\\nb");
    }
}
