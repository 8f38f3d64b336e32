use thiserror::Error;

use crate::lexer::{Lexer, Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file: expected {0}")]
    UnexpectedEof(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Raw numbers read from an input file, before validation
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InputData {
    pub stock_length: f64,
    pub part_lengths: Vec<f64>,
    pub demands: Vec<f64>,
}

/// Parses `number [list] [list]`. Newlines and `//` comments are insignificant.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Comment))
            .collect();
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<InputData, ParseError> {
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_input()
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens.get(self.pos).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.tokens.get(self.pos).cloned();
        match token {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                Ok(t)
            }
            Some(t) if t.kind == TokenKind::Eof => Err(ParseError::UnexpectedEof(expected.to_string())),
            Some(t) => Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: describe(&t),
                span: t.span,
            }),
            None => Err(ParseError::UnexpectedEof(expected.to_string())),
        }
    }

    fn parse_input(&mut self) -> Result<InputData, ParseError> {
        let stock_length = self.parse_number("stock length")?;
        let part_lengths = self.parse_list("part length list")?;
        let demands = self.parse_list("demand list")?;
        self.expect(TokenKind::Eof, "end of input")?;

        Ok(InputData {
            stock_length,
            part_lengths,
            demands,
        })
    }

    fn parse_number(&mut self, expected: &str) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number, expected)?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    fn parse_list(&mut self, expected: &str) -> Result<Vec<f64>, ParseError> {
        self.expect(TokenKind::LBracket, expected)?;

        let mut values = Vec::new();
        loop {
            if self.peek_kind() == TokenKind::RBracket {
                break;
            }
            values.push(self.parse_number("number or ']'")?);
            if self.peek_kind() == TokenKind::Comma {
                self.pos += 1;
            } else {
                break;
            }
        }

        self.expect(TokenKind::RBracket, "',' or ']'")?;
        Ok(values)
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Error => format!("'{}'", token.text),
        kind => format!("{:?}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_lines() {
        let input = Parser::parse("10\n[3,4,5]\n[5,3,2]\n").unwrap();
        assert_eq!(input.stock_length, 10.0);
        assert_eq!(input.part_lengths, vec![3.0, 4.0, 5.0]);
        assert_eq!(input.demands, vec![5.0, 3.0, 2.0]);
    }

    #[test]
    fn test_parse_whitespace_comments_and_trailing_comma() {
        let source = r#"// stock
  12.5   // roll
[ 2.5 , 3e0, ]
[ 4, 1 ]"#;
        let input = Parser::parse(source).unwrap();
        assert_eq!(input.stock_length, 12.5);
        assert_eq!(input.part_lengths, vec![2.5, 3.0]);
        assert_eq!(input.demands, vec![4.0, 1.0]);
    }

    #[test]
    fn test_parse_empty_lists() {
        let input = Parser::parse("5 [] []").unwrap();
        assert!(input.part_lengths.is_empty());
        assert!(input.demands.is_empty());
    }

    #[test]
    fn test_missing_demand_list() {
        let err = Parser::parse("10\n[3,4]\n").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEof("demand list".to_string()));
    }

    #[test]
    fn test_unclosed_list() {
        let err = Parser::parse("10 [3 4] [1]").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, span, .. } => {
                assert_eq!(expected, "',' or ']'");
                assert_eq!(span, Span::new(6, 7));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage() {
        let err = Parser::parse("10 [3] [1] x").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "'x'"));
    }
}
