//! # SQL Lexer - Zero-Copy Tokenizer
//!
//! Single-pass byte scanner producing [`Token`]s that borrow from the input
//! string. Keywords are matched through a compile-time perfect hash map, so
//! keyword lookup is O(1) with no allocation on the hot path (the lone
//! allocation is the uppercased lookup key).
//!
//! ## Recognized Input
//!
//! - **Keywords**: the SELECT grammar's reserved words, case-insensitive
//! - **Identifiers**: unquoted (`table_name`) and double-quoted (`"Order"`)
//! - **Literals**: strings (`'it''s'`, with `''` escaping a quote), integers
//!   and floats (`42`, `3.14`, `1e-3`)
//! - **Operators**: `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`, `+`, `-`, `*`,
//!   `/`, `%`
//! - **Comments**: `-- line` and `/* block */`, skipped transparently
//!
//! Invalid input produces `Token::Error` with a static message; the parser
//! turns it into a positioned parse error.

use phf::phf_map;

use crate::sql::token::{Keyword, Span, Token};

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "SELECT" => Keyword::Select,
    "FROM" => Keyword::From,
    "WHERE" => Keyword::Where,
    "ORDER" => Keyword::Order,
    "BY" => Keyword::By,
    "ASC" => Keyword::Asc,
    "DESC" => Keyword::Desc,
    "LIMIT" => Keyword::Limit,
    "OFFSET" => Keyword::Offset,
    "AS" => Keyword::As,
    "AND" => Keyword::And,
    "OR" => Keyword::Or,
    "NOT" => Keyword::Not,
    "TRUE" => Keyword::True,
    "FALSE" => Keyword::False,
    "NULL" => Keyword::Null,
};

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            token_start: 0,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn span(&self) -> Span {
        Span::new(self.token_start, self.pos - self.token_start)
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.token_start = self.pos;

        if self.is_eof() {
            return Token::Eof;
        }

        let ch = self.current();

        if ch.is_ascii_alphabetic() || ch == b'_' {
            return self.scan_identifier_or_keyword();
        }

        if ch.is_ascii_digit() {
            return self.scan_number();
        }

        match ch {
            b'\'' => self.scan_string(),
            b'"' => self.scan_quoted_identifier(),
            b'-' => self.scan_minus(),
            b'/' => self.scan_slash(),
            b'=' => {
                self.advance();
                Token::Eq
            }
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'!' => self.scan_exclamation(),
            b'+' => {
                self.advance();
                Token::Plus
            }
            b'*' => {
                self.advance();
                Token::Star
            }
            b'%' => {
                self.advance();
                Token::Percent
            }
            b'(' => {
                self.advance();
                Token::LParen
            }
            b')' => {
                self.advance();
                Token::RParen
            }
            b',' => {
                self.advance();
                Token::Comma
            }
            b';' => {
                self.advance();
                Token::Semicolon
            }
            _ => {
                self.advance();
                Token::Error("unexpected character")
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.column += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() {
            match self.current() {
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                }
                b' ' | b'\t' | b'\r' => self.advance(),
                _ => break,
            }
        }
    }

    fn scan_identifier_or_keyword(&mut self) -> Token<'a> {
        let start = self.pos;
        while !self.is_eof() && (self.current().is_ascii_alphanumeric() || self.current() == b'_')
        {
            self.advance();
        }

        let ident = &self.input[start..self.pos];
        let upper = ident.to_ascii_uppercase();

        if let Some(&keyword) = KEYWORDS.get(&upper) {
            Token::Keyword(keyword)
        } else {
            Token::Ident(ident)
        }
    }

    fn scan_number(&mut self) -> Token<'a> {
        let start = self.pos;
        while !self.is_eof() && self.current().is_ascii_digit() {
            self.advance();
        }

        if !self.is_eof() && self.current() == b'.' {
            if let Some(next) = self.peek_char() {
                if next.is_ascii_digit() {
                    self.advance();
                    while !self.is_eof() && self.current().is_ascii_digit() {
                        self.advance();
                    }
                }
            }
        }

        if !self.is_eof() && (self.current() == b'e' || self.current() == b'E') {
            let mut lookahead = self.pos + 1;
            if matches!(self.bytes.get(lookahead), Some(b'+') | Some(b'-')) {
                lookahead += 1;
            }
            if matches!(self.bytes.get(lookahead), Some(b) if b.is_ascii_digit()) {
                while self.pos < lookahead {
                    self.advance();
                }
                while !self.is_eof() && self.current().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        Token::Number(&self.input[start..self.pos])
    }

    fn scan_string(&mut self) -> Token<'a> {
        self.advance();
        let start = self.pos;

        loop {
            if self.is_eof() {
                return Token::Error("unterminated string");
            }

            if self.current() == b'\'' {
                if self.peek_char() == Some(b'\'') {
                    self.advance();
                    self.advance();
                } else {
                    let end = self.pos;
                    self.advance();
                    return Token::String(&self.input[start..end]);
                }
            } else {
                self.advance();
            }
        }
    }

    fn scan_quoted_identifier(&mut self) -> Token<'a> {
        self.advance();
        let start = self.pos;

        while !self.is_eof() && self.current() != b'"' {
            self.advance();
        }

        if self.is_eof() {
            return Token::Error("unterminated quoted identifier");
        }

        let end = self.pos;
        self.advance();
        Token::Ident(&self.input[start..end])
    }

    fn scan_minus(&mut self) -> Token<'a> {
        if self.peek_char() == Some(b'-') {
            while !self.is_eof() && self.current() != b'\n' {
                self.advance();
            }
            return self.next_token();
        }
        self.advance();
        Token::Minus
    }

    fn scan_slash(&mut self) -> Token<'a> {
        if self.peek_char() == Some(b'*') {
            self.advance();
            self.advance();
            loop {
                if self.is_eof() {
                    return Token::Error("unterminated block comment");
                }
                if self.current() == b'\n' {
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                    continue;
                }
                if self.current() == b'*' && self.peek_char() == Some(b'/') {
                    self.advance();
                    self.advance();
                    return self.next_token();
                }
                self.advance();
            }
        }
        self.advance();
        Token::Slash
    }

    fn scan_less_than(&mut self) -> Token<'a> {
        self.advance();
        match (!self.is_eof()).then(|| self.current()) {
            Some(b'=') => {
                self.advance();
                Token::LtEq
            }
            Some(b'>') => {
                self.advance();
                Token::Neq
            }
            _ => Token::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> Token<'a> {
        self.advance();
        if !self.is_eof() && self.current() == b'=' {
            self.advance();
            Token::GtEq
        } else {
            Token::Gt
        }
    }

    fn scan_exclamation(&mut self) -> Token<'a> {
        self.advance();
        if !self.is_eof() && self.current() == b'=' {
            self.advance();
            Token::Neq
        } else {
            Token::Error("expected '=' after '!'")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = matches!(token, Token::Eof);
            out.push(token);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            tokens("select FROM WhErE"),
            [
                Token::Keyword(Keyword::Select),
                Token::Keyword(Keyword::From),
                Token::Keyword(Keyword::Where),
                Token::Eof
            ]
        );
    }

    #[test]
    fn identifiers_keep_their_case() {
        assert_eq!(
            tokens("Users \"Order\""),
            [Token::Ident("Users"), Token::Ident("Order"), Token::Eof]
        );
    }

    #[test]
    fn numbers_and_strings() {
        assert_eq!(
            tokens("42 3.14 1e-3 'hi'"),
            [
                Token::Number("42"),
                Token::Number("3.14"),
                Token::Number("1e-3"),
                Token::String("hi"),
                Token::Eof
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            tokens("= != <> < <= > >= + - * / %"),
            [
                Token::Eq,
                Token::Neq,
                Token::Neq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::Eof
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("a -- rest of line\n b /* mid */ c"),
            [
                Token::Ident("a"),
                Token::Ident("b"),
                Token::Ident("c"),
                Token::Eof
            ]
        );
    }

    #[test]
    fn line_and_column_track_newlines() {
        let mut lexer = Lexer::new("a\n  b");
        lexer.next_token();
        lexer.next_token();
        assert_eq!(lexer.line(), 2);
        assert!(lexer.column() > 1);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(tokens("'oops")[0], Token::Error(_)));
    }
}
