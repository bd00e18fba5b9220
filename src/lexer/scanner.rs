//! Character-level scanner: source text in, a flat token stream out.

use crate::error::LexError;
use crate::lexer::token::{lookup_keyword, Token, TokenKind};

/// Scans Rivet source text into tokens.
pub struct Scanner {
    source: Vec<char>,
    position: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    /// Scan the entire source into a token vector terminated by `Eof`.
    pub fn scan_tokens(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments();
        let line = self.line;

        let Some(c) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, line));
        };

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '"' => self.string(line)?,
            c if c.is_ascii_digit() => self.number(c),
            c if is_ident_start(c) => self.identifier(c),
            other => return Err(LexError::UnexpectedChar(other, line)),
        };

        Ok(Token::new(kind, line))
    }

    fn string(&mut self, start_line: usize) -> Result<TokenKind, LexError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::UnterminatedString(start_line)),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => return Err(LexError::InvalidEscape(other, self.line)),
                    None => return Err(LexError::UnterminatedString(start_line)),
                },
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::Str(value))
    }

    fn number(&mut self, first: char) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance().unwrap());
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push(self.advance().unwrap());
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                text.push(self.advance().unwrap());
            }
        }
        if is_float {
            TokenKind::Float(text.parse().expect("scanner only emits valid float text"))
        } else {
            TokenKind::Int(text.parse().expect("scanner only emits valid integer text"))
        }
    }

    fn identifier(&mut self, first: char) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        while self.peek().is_some_and(is_ident_continue) {
            text.push(self.advance().unwrap());
        }
        lookup_keyword(&text).unwrap_or(TokenKind::Ident(text))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Scanner::new(src)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_arithmetic_expression() {
        assert_eq!(
            kinds("1 + 2"),
            vec![TokenKind::Int(1), TokenKind::Plus, TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            kinds("let x = fn(a) { a };"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("x".to_string()),
                TokenKind::Assign,
                TokenKind::Fn,
                TokenKind::LParen,
                TokenKind::Ident("a".to_string()),
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Ident("a".to_string()),
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_string_with_escapes() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::Str("a\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn scans_float_literal() {
        assert_eq!(kinds("3.14"), vec![TokenKind::Float(3.14), TokenKind::Eof]);
    }

    #[test]
    fn two_char_operators_are_not_split() {
        assert_eq!(
            kinds("a == b != c"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Eq,
                TokenKind::Ident("b".to_string()),
                TokenKind::NotEq,
                TokenKind::Ident("c".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(
            Scanner::new("\"abc").scan_tokens(),
            Err(LexError::UnterminatedString(1))
        ));
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(
            kinds("1 // comment\n+ 2"),
            vec![TokenKind::Int(1), TokenKind::Plus, TokenKind::Int(2), TokenKind::Eof]
        );
    }
}
