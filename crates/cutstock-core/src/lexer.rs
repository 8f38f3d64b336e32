use std::str::Chars;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Comma,
    LBracket,
    RBracket,

    Newline,
    Comment,
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

/// Tokenizer for cutting-stock input files:
///
/// ```text
/// 10
/// [3, 4, 5]
/// [5, 3, 2]
/// ```
pub struct Lexer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: usize,
    current: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            pos: 0,
            current,
        }
    }

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current;
        self.current = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // first /
        self.advance(); // second /
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.token_from(TokenKind::Comment, start)
    }

    fn eat_digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }

        let mut digits = self.eat_digits();

        if self.peek() == Some('.') {
            self.advance();
            digits += self.eat_digits();
        }

        // Exponent, only when digits follow
        if digits > 0 && matches!(self.peek(), Some('e') | Some('E')) {
            let mut ahead = self.chars.clone();
            let next = ahead.next();
            let exponent_follows = match next {
                Some(c) if c.is_ascii_digit() => true,
                Some('-') | Some('+') => ahead.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                self.advance(); // e
                if matches!(self.peek(), Some('-') | Some('+')) {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        let kind = if digits > 0 { TokenKind::Number } else { TokenKind::Error };
        self.token_from(kind, start)
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, Span::new(start, self.pos), &self.source[start..self.pos])
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.advance();
        self.token_from(kind, start)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), "");
        };

        match c {
            '\n' => self.single(TokenKind::Newline),
            '/' if self.peek_next() == Some('/') => self.skip_line_comment(),
            ',' => self.single(TokenKind::Comma),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '-' | '+' | '.' => self.read_number(),
            c if c.is_ascii_digit() => self.read_number(),
            _ => self.single(TokenKind::Error),
        }
    }
}
