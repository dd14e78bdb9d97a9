//! Lex a GPR string into a series of tokens for later parsing

use crate::io::gpr_parse::token::Token;

/// Splits a rule into parentheses, operators and gene identifiers.
///
/// Any run of characters that is neither whitespace nor a parenthesis is a word; the words
/// `and`/`or` (in any case) are operators, everything else is a gene identifier.
pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the source into tokens, always terminated by [`Token::Eof`]
    pub fn lex(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token::Eof);
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.tokens.push(Token::LeftParen),
            ')' => self.tokens.push(Token::RightParen),
            c if c.is_whitespace() => {}
            _ => self.read_word(),
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn read_word(&mut self) {
        while !self.is_at_end() && !Lexer::is_delimiter(self.source[self.current]) {
            self.current += 1;
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let token = match text.to_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            _ => Token::Identifier(text),
        };
        self.tokens.push(token);
    }

    fn is_delimiter(c: char) -> bool {
        c.is_whitespace() || c == '(' || c == ')'
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}
