//! Lexer for query string syntax
//!
//! Splits a Lucene-style query string into tokens. Operators are
//! case-sensitive (`AND`, `OR`, `NOT`, `TO`); lowercase spellings are
//! ordinary words.

use crate::error::{LexdumpError, Result};

/// Token types for query string parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An unquoted word; may contain wildcard characters
    Word(String),
    /// A quoted string
    Quoted(String),
    /// Colon separator (field:value)
    Colon,

    And,
    Or,
    Not,
    To,

    /// `~` with optional fuzziness or slop
    Tilde(Option<u32>),
    /// `^` with optional boost
    Caret(Option<f32>),

    /// `[` or `{`
    RangeStart { inclusive: bool },
    /// `]` or `}`
    RangeEnd { inclusive: bool },

    LeftParen,
    RightParen,

    /// Required clause prefix
    Plus,
    /// Prohibited clause prefix
    Minus,

    /// End of input
    Eof,
}

/// Whether a word is a wildcard pattern
pub fn has_wildcard(word: &str) -> bool {
    word.contains(|c: char| c == '*' || c == '?')
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Lex the whole input, `Eof` included
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        let single = match ch {
            ':' => Some(Token::Colon),
            '[' => Some(Token::RangeStart { inclusive: true }),
            '{' => Some(Token::RangeStart { inclusive: false }),
            ']' => Some(Token::RangeEnd { inclusive: true }),
            '}' => Some(Token::RangeEnd { inclusive: false }),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match ch {
            '~' => {
                self.advance();
                Ok(Token::Tilde(self.read_number().and_then(|n| n.parse().ok())))
            }
            '^' => {
                self.advance();
                Ok(Token::Caret(self.read_number().and_then(|n| n.parse().ok())))
            }
            '"' => {
                self.advance();
                self.read_quoted()
            }
            '&' | '|' => self.read_symbolic_operator(ch),
            _ if Self::is_word_char(ch) => Ok(self.read_word()),
            _ => Err(LexdumpError::QueryParseError(format!(
                "Unexpected character at position {}: '{}'",
                self.position, ch
            ))),
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(ch) = self.current_char() {
            if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char() {
                    word.push(escaped);
                    self.advance();
                }
            } else if Self::is_word_char(ch) || (ch == '-' && !word.is_empty()) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match word.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            "TO" => Token::To,
            _ => Token::Word(word),
        }
    }

    /// `&&` and `||`
    fn read_symbolic_operator(&mut self, ch: char) -> Result<Token> {
        if self.peek() != Some(ch) {
            return Err(LexdumpError::QueryParseError(format!(
                "Dangling '{}' at position {}",
                ch, self.position
            )));
        }
        self.advance();
        self.advance();
        Ok(if ch == '&' { Token::And } else { Token::Or })
    }

    fn read_quoted(&mut self) -> Result<Token> {
        let mut s = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                '"' => return Ok(Token::Quoted(s)),
                '\\' => {
                    if let Some(escaped) = self.current_char() {
                        s.push(escaped);
                        self.advance();
                    }
                }
                _ => s.push(ch),
            }
        }

        Err(LexdumpError::QueryParseError(
            "Unterminated quoted string".to_string(),
        ))
    }

    fn read_number(&mut self) -> Option<String> {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }
        if self.position == start {
            None
        } else {
            Some(self.input[start..self.position].iter().collect())
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    /// Characters that may appear anywhere in a word
    fn is_word_char(ch: char) -> bool {
        !ch.is_whitespace()
            && !matches!(
                ch,
                ':' | '[' | ']' | '{' | '}' | '(' | ')' | '+' | '-' | '"' | '~' | '^' | '&' | '|'
            )
    }
}
